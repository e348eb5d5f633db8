//! Error metrics for evaluating forecast performance
//!
//! All metrics compare predictions `P` with actuals `A` of equal, non-zero
//! length. Inputs that would make a metric infinite or `NaN` are reported
//! as [`ForecastError::MetricError`].

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selectable error metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "MAPE")]
    Mape,
    #[serde(rename = "WAPE")]
    Wape,
    #[serde(rename = "MAE")]
    Mae,
    #[serde(rename = "RMSE")]
    Rmse,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Mape, Metric::Wape, Metric::Mae, Metric::Rmse];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Mape => "MAPE",
            Metric::Wape => "WAPE",
            Metric::Mae => "MAE",
            Metric::Rmse => "RMSE",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ForecastError::ConfigurationError(format!("unknown metric '{}'", s)))
    }
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::MetricError(format!(
            "actual ({}) and predicted ({}) must have the same non-zero length",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.iter().chain(predicted).any(|v| !v.is_finite()) {
        return Err(ForecastError::MetricError(
            "actual and predicted values must be finite".to_string(),
        ));
    }
    Ok(())
}

/// Mean absolute percentage error, in percent
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    if let Some(i) = actual.iter().position(|&a| a == 0.0) {
        return Err(ForecastError::MetricError(format!(
            "MAPE is undefined: actual value at position {} is zero",
            i
        )));
    }

    let n = actual.len() as f64;
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs() / a.abs())
        .sum();
    Ok(sum / n * 100.0)
}

/// Weighted absolute percentage error, in percent
pub fn weighted_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let total: f64 = actual.iter().map(|a| a.abs()).sum();
    if total == 0.0 {
        return Err(ForecastError::MetricError(
            "WAPE is undefined: actual values sum to zero".to_string(),
        ));
    }

    let abs_err: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum();
    Ok(abs_err / total * 100.0)
}

/// Mean absolute error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let n = actual.len() as f64;
    Ok(actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum::<f64>() / n)
}

/// Root mean squared error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let n = actual.len() as f64;
    let mse = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum::<f64>() / n;
    Ok(mse.sqrt())
}

/// The four error metrics of one strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(rename = "MAPE")]
    pub mape: f64,
    #[serde(rename = "WAPE")]
    pub wape: f64,
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
}

impl Metrics {
    /// Compute all four metrics
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        Ok(Self {
            mape: mean_absolute_percentage_error(actual, predicted)?,
            wape: weighted_absolute_percentage_error(actual, predicted)?,
            mae: mean_absolute_error(actual, predicted)?,
            rmse: root_mean_squared_error(actual, predicted)?,
        })
    }

    /// Value of one metric
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Mape => self.mape,
            Metric::Wape => self.wape,
            Metric::Mae => self.mae,
            Metric::Rmse => self.rmse,
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        writeln!(f, "  WAPE:  {:.4}%", self.wape)?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        Ok(())
    }
}
