//! CART regression trees shared by the ensemble strategies
//!
//! Splits minimise the summed squared error of the two children. Samples are
//! addressed by index so bootstrap samples can repeat rows without copying
//! the feature matrix.

use std::cmp::Ordering;

const MIN_GAIN: f64 = 1e-12;

/// Leaf node in a regression tree
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionLeaf {
    /// Mean target of the samples in the leaf
    pub value: f64,
    pub n_samples: usize,
}

/// Internal node in a regression tree
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionNode {
    pub feature_idx: usize,
    /// Samples with `x[feature_idx] <= threshold` go left
    pub threshold: f64,
    pub left: Box<RegressionTreeNode>,
    pub right: Box<RegressionTreeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegressionTreeNode {
    Node(RegressionNode),
    Leaf(RegressionLeaf),
}

impl RegressionTreeNode {
    /// Leaf nodes have depth 0
    pub fn depth(&self) -> usize {
        match self {
            RegressionTreeNode::Leaf(_) => 0,
            RegressionTreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    fn n_samples(&self) -> usize {
        match self {
            RegressionTreeNode::Leaf(leaf) => leaf.n_samples,
            RegressionTreeNode::Node(n) => n.left.n_samples() + n.right.n_samples(),
        }
    }
}

/// Growth limits of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
}

/// A fitted regression tree
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    root: RegressionTreeNode,
    n_features: usize,
}

impl RegressionTree {
    /// Grow a tree on the rows of `x` listed in `indices` (repeats allowed)
    ///
    /// `x` and `y` must be non-empty and of equal length; `indices` must be
    /// non-empty and in range.
    pub fn fit(x: &[Vec<f64>], y: &[f64], indices: &[usize], params: TreeParams) -> Self {
        let n_features = x.first().map_or(0, Vec::len);
        let mut indices = indices.to_vec();
        let root = build(x, y, &mut indices, 0, params);
        Self { root, n_features }
    }

    pub fn predict_one(&self, features: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                RegressionTreeNode::Leaf(leaf) => return leaf.value,
                RegressionTreeNode::Node(n) => {
                    let value = features.get(n.feature_idx).copied().unwrap_or(0.0);
                    node = if value <= n.threshold { &n.left } else { &n.right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn root(&self) -> &RegressionTreeNode {
        &self.root
    }

    /// Samples passing through split nodes, accumulated per feature
    pub fn add_importances(&self, importances: &mut [f64]) {
        fn walk(node: &RegressionTreeNode, importances: &mut [f64]) {
            if let RegressionTreeNode::Node(n) = node {
                if let Some(slot) = importances.get_mut(n.feature_idx) {
                    *slot += node.n_samples() as f64;
                }
                walk(&n.left, importances);
                walk(&n.right, importances);
            }
        }
        walk(&self.root, importances);
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

/// Scale accumulated importances to sum to one
pub fn normalize_importances(importances: &mut [f64]) {
    let total: f64 = importances.iter().sum();
    if total > 0.0 {
        for v in importances.iter_mut() {
            *v /= total;
        }
    }
}

fn mean_of(y: &[f64], indices: &[usize]) -> f64 {
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn sse_of(y: &[f64], indices: &[usize]) -> f64 {
    let mean = mean_of(y, indices);
    indices.iter().map(|&i| (y[i] - mean).powi(2)).sum()
}

fn leaf(y: &[f64], indices: &[usize]) -> RegressionTreeNode {
    RegressionTreeNode::Leaf(RegressionLeaf {
        value: mean_of(y, indices),
        n_samples: indices.len(),
    })
}

fn build(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &mut [usize],
    depth: usize,
    params: TreeParams,
) -> RegressionTreeNode {
    let parent_sse = sse_of(y, indices);
    if indices.len() < params.min_samples_split
        || depth >= params.max_depth
        || parent_sse < MIN_GAIN
    {
        return leaf(y, indices);
    }

    let Some((feature_idx, threshold)) = best_split(x, y, indices, parent_sse) else {
        return leaf(y, indices);
    };

    // partition in place: left block first
    let mut cut = 0;
    for i in 0..indices.len() {
        if x[indices[i]][feature_idx] <= threshold {
            indices.swap(i, cut);
            cut += 1;
        }
    }
    if cut == 0 || cut == indices.len() {
        return leaf(y, indices);
    }

    let (left, right) = indices.split_at_mut(cut);
    RegressionTreeNode::Node(RegressionNode {
        feature_idx,
        threshold,
        left: Box::new(build(x, y, left, depth + 1, params)),
        right: Box::new(build(x, y, right, depth + 1, params)),
    })
}

/// Best `(feature, threshold)` by squared-error reduction
fn best_split(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    parent_sse: f64,
) -> Option<(usize, f64)> {
    let n = indices.len();
    let n_features = x[indices[0]].len();
    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();

    let mut best: Option<(usize, f64)> = None;
    let mut best_gain = MIN_GAIN;
    let mut order = indices.to_vec();

    for feature in 0..n_features {
        order.sort_by(|&a, &b| {
            x[a][feature]
                .partial_cmp(&x[b][feature])
                .unwrap_or(Ordering::Equal)
        });

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 0..n - 1 {
            let yi = y[order[k]];
            left_sum += yi;
            left_sq += yi * yi;

            let here = x[order[k]][feature];
            let next = x[order[k + 1]][feature];
            if next <= here {
                continue;
            }

            let n_left = (k + 1) as f64;
            let n_right = (n - k - 1) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left)
                + (right_sq - right_sum * right_sum / n_right);
            let gain = parent_sse - sse;
            if gain > best_gain {
                best_gain = gain;
                best = Some((feature, (here + next) / 2.0));
            }
        }
    }

    best
}
