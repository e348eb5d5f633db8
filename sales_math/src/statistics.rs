//! Descriptive statistics over plain `f64` slices
//!
//! Thin wrappers over `statrs` that turn its `NaN` conventions for short
//! inputs into explicit errors.

use crate::{MathError, Result};
use statrs::statistics::{Data, Median, Statistics};

/// Arithmetic mean of the values
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Mean requires at least one value".to_string(),
        ));
    }

    Ok(values.iter().mean())
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Sample standard deviation requires at least 2 values, have {}",
            values.len()
        )));
    }

    Ok(values.iter().std_dev())
}

/// Median of the values
pub fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Median requires at least one value".to_string(),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Median is undefined for non-finite values".to_string(),
        ));
    }

    Ok(Data::new(values.to_vec()).median())
}

/// Minimum and maximum of the values
pub fn min_max(values: &[f64]) -> Result<(f64, f64)> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Range requires at least one value".to_string(),
        ));
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok((min, max))
}
