//! Gradient boosted regression trees (squared loss)
//!
//! Starts from the training mean; each round fits a shallow tree to the
//! current residuals and adds it scaled by the learning rate.

use super::tree::{normalize_importances, RegressionTree, TreeParams};
use super::{FittedModel, ForecastModel, ProjectionContext, StrategyKind};
use crate::config::GradientBoostingConfig;
use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GradientBoostingModel {
    n_estimators: usize,
    learning_rate: f64,
    params: TreeParams,
}

impl GradientBoostingModel {
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            params: TreeParams {
                max_depth: 5,
                min_samples_split: 2,
            },
        }
    }

    pub fn from_config(config: &GradientBoostingConfig) -> Result<Self> {
        if config.n_estimators == 0 {
            return Err(ForecastError::ConfigurationError(
                "gradient boosting needs at least one round".to_string(),
            ));
        }
        if !(config.learning_rate > 0.0 && config.learning_rate <= 1.0) {
            return Err(ForecastError::ConfigurationError(format!(
                "learning rate must be in (0, 1], got {}",
                config.learning_rate
            )));
        }
        Ok(Self::new()
            .with_n_estimators(config.n_estimators)
            .with_learning_rate(config.learning_rate)
            .with_max_depth(config.max_depth)
            .with_min_samples_split(config.min_samples_split))
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.params.max_depth = max_depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.params.min_samples_split = min_samples_split;
        self
    }
}

impl Default for GradientBoostingModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Trained boosting ensemble
#[derive(Debug, Clone)]
pub struct FittedGradientBoosting {
    feature_columns: Vec<String>,
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl FittedGradientBoosting {
    pub fn predict_one(&self, features: &[f64]) -> f64 {
        self.init
            + self
                .trees
                .iter()
                .map(|t| self.learning_rate * t.predict_one(features))
                .sum::<f64>()
    }

    /// Rounds actually fitted; boosting stops early once residuals vanish
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let mut importances = vec![0.0; self.feature_columns.len()];
        for tree in &self.trees {
            tree.add_importances(&mut importances);
        }
        normalize_importances(&mut importances);
        self.feature_columns.iter().cloned().zip(importances).collect()
    }
}

impl ForecastModel for GradientBoostingModel {
    type Fitted = FittedGradientBoosting;

    fn kind(&self) -> StrategyKind {
        StrategyKind::GradientBoosting
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

        let init = y.iter().sum::<f64>() / y.len() as f64;
        let mut current = vec![init; y.len()];
        let all: Vec<usize> = (0..y.len()).collect();
        let mut trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, c)| t - c).collect();
            if residuals.iter().all(|r| r.abs() < 1e-12) {
                break;
            }
            let tree = RegressionTree::fit(&x, &residuals, &all, self.params);
            for (value, row) in current.iter_mut().zip(&x) {
                *value += self.learning_rate * tree.predict_one(row);
            }
            trees.push(tree);
        }

        debug!(rounds = trees.len(), init, "fitted gradient boosting");

        Ok(FittedGradientBoosting {
            feature_columns: feature_columns.to_vec(),
            init,
            learning_rate: self.learning_rate,
            trees,
        })
    }
}

impl FittedModel for FittedGradientBoosting {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GradientBoosting
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
