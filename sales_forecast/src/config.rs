//! Configuration for a forecasting session
//!
//! All values have defaults matching the reference dashboard: a three month
//! holdout, a three month projection and the four standard strategies.
//! A configuration can be read from JSON; missing keys fall back to defaults.

use crate::error::{ForecastError, Result};
use crate::metrics::Metric;
use crate::models::StrategyKind;
use sales_math::WindowAlignment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Valid holdout sizes in the reference configuration
pub const TEST_HORIZON_RANGE: std::ops::RangeInclusive<usize> = 2..=4;

/// Feature engineering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Lag offsets in months
    pub lags: Vec<usize>,
    /// Rolling window sizes in months
    pub rolling_windows: Vec<usize>,
    /// Placement of the rolling windows
    pub rolling_alignment: WindowAlignment,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lags: vec![1, 2, 3, 6],
            rolling_windows: vec![3, 6],
            rolling_alignment: WindowAlignment::Centered,
        }
    }
}

/// ARIMA order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArimaConfig {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl Default for ArimaConfig {
    fn default() -> Self {
        Self { p: 1, d: 1, q: 1 }
    }
}

/// Bagging ensemble parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub random_state: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 2,
            random_state: 42,
        }
    }
}

/// Boosting ensemble parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientBoostingConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_samples_split: usize,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 5,
            learning_rate: 0.1,
            min_samples_split: 2,
        }
    }
}

/// Seasonal naive parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalNaiveConfig {
    pub season_length: usize,
}

impl Default for SeasonalNaiveConfig {
    fn default() -> Self {
        Self { season_length: 3 }
    }
}

/// Full session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of trailing months held out for evaluation
    pub test_horizon: usize,
    /// Largest accepted future projection length
    pub max_forecast_horizon: usize,
    /// Metric used when no metric is named explicitly
    pub selection_metric: Metric,
    /// Multiplier of the historical standard deviation for the projection band
    pub confidence_z: f64,
    /// MAPE threshold for the pass/fail comparison
    pub mape_threshold: f64,
    /// Strategies trained by `run_all`, in execution order
    pub strategies: Vec<StrategyKind>,
    pub features: FeatureConfig,
    pub arima: ArimaConfig,
    pub random_forest: RandomForestConfig,
    pub gradient_boosting: GradientBoostingConfig,
    pub seasonal_naive: SeasonalNaiveConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            test_horizon: 3,
            max_forecast_horizon: 6,
            selection_metric: Metric::Mape,
            confidence_z: 1.96,
            mape_threshold: 10.0,
            strategies: vec![
                StrategyKind::Naive,
                StrategyKind::Arima,
                StrategyKind::RandomForest,
                StrategyKind::GradientBoosting,
            ],
            features: FeatureConfig::default(),
            arima: ArimaConfig::default(),
            random_forest: RandomForestConfig::default(),
            gradient_boosting: GradientBoostingConfig::default(),
            seasonal_naive: SeasonalNaiveConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Parse and validate a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ForecastConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Set the holdout size
    pub fn with_test_horizon(mut self, test_horizon: usize) -> Self {
        self.test_horizon = test_horizon;
        self
    }

    /// Set the strategies trained by `run_all`
    pub fn with_strategies(mut self, strategies: Vec<StrategyKind>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Check every parameter against its accepted range
    pub fn validate(&self) -> Result<()> {
        if !TEST_HORIZON_RANGE.contains(&self.test_horizon) {
            return Err(invalid(format!(
                "test_horizon must be between {} and {}, got {}",
                TEST_HORIZON_RANGE.start(),
                TEST_HORIZON_RANGE.end(),
                self.test_horizon
            )));
        }
        if self.max_forecast_horizon == 0 {
            return Err(invalid("max_forecast_horizon must be positive"));
        }
        if !self.confidence_z.is_finite() || self.confidence_z < 0.0 {
            return Err(invalid("confidence_z must be a non-negative number"));
        }
        if !self.mape_threshold.is_finite() || self.mape_threshold < 0.0 {
            return Err(invalid("mape_threshold must be a non-negative number"));
        }
        if self.strategies.is_empty() {
            return Err(invalid("at least one strategy must be configured"));
        }

        let features = &self.features;
        if features.lags.iter().any(|&l| l == 0) {
            return Err(invalid("lag offsets must be positive"));
        }
        if features.rolling_windows.iter().any(|&w| w == 0) {
            return Err(invalid("rolling windows must be positive"));
        }

        if self.arima.p == 0 && self.arima.q == 0 {
            return Err(invalid("ARIMA needs a non-zero AR or MA order"));
        }
        if self.arima.p > 10 || self.arima.q > 10 || self.arima.d > 2 {
            return Err(invalid(format!(
                "ARIMA order ({},{},{}) out of range (p,q <= 10, d <= 2)",
                self.arima.p, self.arima.d, self.arima.q
            )));
        }

        if self.random_forest.n_estimators == 0 || self.random_forest.max_depth == 0 {
            return Err(invalid(
                "random_forest needs positive n_estimators and max_depth",
            ));
        }
        if self.random_forest.min_samples_split < 2 {
            return Err(invalid("random_forest.min_samples_split must be at least 2"));
        }

        let gb = &self.gradient_boosting;
        if gb.n_estimators == 0 || gb.max_depth == 0 {
            return Err(invalid(
                "gradient_boosting needs positive n_estimators and max_depth",
            ));
        }
        if !(gb.learning_rate > 0.0 && gb.learning_rate <= 1.0) {
            return Err(invalid(format!(
                "gradient_boosting.learning_rate must be in (0, 1], got {}",
                gb.learning_rate
            )));
        }
        if gb.min_samples_split < 2 {
            return Err(invalid(
                "gradient_boosting.min_samples_split must be at least 2",
            ));
        }

        if self.seasonal_naive.season_length == 0 {
            return Err(invalid("seasonal_naive.season_length must be positive"));
        }

        Ok(())
    }

    /// Validate a requested future projection length
    pub fn check_forecast_horizon(&self, months: usize) -> Result<()> {
        if months == 0 || months > self.max_forecast_horizon {
            return Err(invalid(format!(
                "forecast horizon must be between 1 and {}, got {}",
                self.max_forecast_horizon, months
            )));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ForecastError {
    ForecastError::ConfigurationError(msg.into())
}
