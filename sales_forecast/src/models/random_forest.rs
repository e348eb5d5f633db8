//! Bagging ensemble of regression trees

use super::tree::{normalize_importances, RegressionTree, TreeParams};
use super::{FittedModel, ForecastModel, ProjectionContext, StrategyKind};
use crate::config::RandomForestConfig;
use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// Random forest regressor over the engineered features
///
/// Every tree sees all features and a bootstrap sample of the training rows
/// drawn with `StdRng::seed_from_u64(random_state + i)`, so a fixed
/// `random_state` gives identical forests.
#[derive(Debug, Clone)]
pub struct RandomForestModel {
    n_estimators: usize,
    random_state: u64,
    params: TreeParams,
}

impl RandomForestModel {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            random_state: 42,
            params: TreeParams {
                max_depth: 10,
                min_samples_split: 2,
            },
        }
    }

    pub fn from_config(config: &RandomForestConfig) -> Result<Self> {
        if config.n_estimators == 0 {
            return Err(ForecastError::ConfigurationError(
                "random forest needs at least one tree".to_string(),
            ));
        }
        Ok(Self::new(config.n_estimators)
            .with_max_depth(config.max_depth)
            .with_min_samples_split(config.min_samples_split)
            .with_random_state(config.random_state))
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.params.max_depth = max_depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.params.min_samples_split = min_samples_split;
        self
    }

    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }
}

fn bootstrap_sample(n_samples: usize, seed: u64) -> Vec<usize> {
    let dist = Uniform::from(0..n_samples);
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_samples).map(|_| dist.sample(&mut rng)).collect()
}

/// Trained random forest
#[derive(Debug, Clone)]
pub struct FittedRandomForest {
    feature_columns: Vec<String>,
    trees: Vec<RegressionTree>,
}

impl FittedRandomForest {
    /// Mean of the tree predictions for one feature vector
    pub fn predict_one(&self, features: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict_one(features)).sum();
        total / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Normalised split-sample counts per feature column
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let mut importances = vec![0.0; self.feature_columns.len()];
        for tree in &self.trees {
            tree.add_importances(&mut importances);
        }
        normalize_importances(&mut importances);
        self.feature_columns.iter().cloned().zip(importances).collect()
    }
}

impl ForecastModel for RandomForestModel {
    type Fitted = FittedRandomForest;

    fn kind(&self) -> StrategyKind {
        StrategyKind::RandomForest
    }

    fn fit(&self, train: &FeatureTable, feature_columns: &[String]) -> Result<Self::Fitted> {
        if feature_columns.is_empty() {
            return Err(ForecastError::fit_failure(
                self.kind().name(),
                "no feature columns selected",
            ));
        }
        let x = train.matrix(feature_columns)?;
        let y = train.sales();
        if y.is_empty() {
            return Err(ForecastError::fit_failure(
                self.kind().name(),
                "training window is empty",
            ));
        }

        let trees: Vec<RegressionTree> = (0..self.n_estimators)
            .map(|i| {
                let sample = bootstrap_sample(y.len(), self.random_state.wrapping_add(i as u64));
                RegressionTree::fit(&x, &y, &sample, self.params)
            })
            .collect();

        debug!(
            trees = trees.len(),
            max_depth = trees.iter().map(RegressionTree::depth).max().unwrap_or(0),
            "fitted random forest"
        );

        Ok(FittedRandomForest {
            feature_columns: feature_columns.to_vec(),
            trees,
        })
    }
}

impl FittedModel for FittedRandomForest {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RandomForest
    }

    fn predict(&self, test: &FeatureTable) -> Result<Vec<f64>> {
        let x = test.matrix(&self.feature_columns)?;
        Ok(x.iter().map(|row| self.predict_one(row)).collect())
    }

    /// Every step reuses the final historical feature row unchanged
    fn project(&self, horizon: usize, context: &ProjectionContext<'_>) -> Result<Vec<f64>> {
        let last = context.last_feature_vector(&self.feature_columns)?;
        Ok((0..horizon).map(|_| self.predict_one(&last)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeSeries;
    use crate::features::build_features;
    use crate::split::split;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn table() -> FeatureTable {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let values = (0..24)
            .map(|i| 100.0 + 3.0 * i as f64 + if i % 12 == 11 { 40.0 } else { 0.0 })
            .collect();
        build_features(&TimeSeries::from_values(start, values).unwrap()).unwrap()
    }

    #[test]
    fn test_bootstrap_is_seeded() {
        assert_eq!(bootstrap_sample(10, 7), bootstrap_sample(10, 7));
        assert!(bootstrap_sample(10, 7).iter().all(|&i| i < 10));
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let t = table();
        let s = split(&t, 3).unwrap();
        let model = RandomForestModel::new(20).with_random_state(3);
        let (_, a) = model.fit_predict(&s.train, &s.test, t.feature_columns()).unwrap();
        let (_, b) = model.fit_predict(&s.train, &s.test, t.feature_columns()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_static_row_projection() {
        let t = table();
        let s = split(&t, 3).unwrap();
        let fitted = RandomForestModel::new(10)
            .fit(&s.train, t.feature_columns())
            .unwrap();
        let context = ProjectionContext::new(&t);
        let projected = fitted.project(4, &context).unwrap();
        assert_eq!(projected.len(), 4);
        assert!(projected.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_importances_sum_to_one() {
        let t = table();
        let fitted = RandomForestModel::new(10).fit(&t, t.feature_columns()).unwrap();
        let importances = fitted.feature_importances();
        assert_eq!(importances.len(), t.feature_columns().len());
        let total: f64 = importances.iter().map(|(_, v)| v).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_predictions_within_training_range() {
        let t = table();
        let s = split(&t, 3).unwrap();
        let (_, predictions) = RandomForestModel::new(10)
            .fit_predict(&s.train, &s.test, t.feature_columns())
            .unwrap();
        let train = s.train.sales();
        let lo = train.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = train.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(predictions.iter().all(|&p| p >= lo && p <= hi));
    }
}
