//! # Sales Math
//!
//! Numeric building blocks shared by the forecasting engine.
//! This crate provides descriptive statistics, rolling window statistics
//! and a small dense least-squares solver.

use thiserror::Error;

pub mod least_squares;
pub mod rolling;
pub mod statistics;

pub use rolling::{rolling_mean, rolling_std, WindowAlignment};
pub use statistics::{mean, median, sample_std_dev};

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MathError::InsufficientData("need 2 values".to_string());
        assert_eq!(
            err.to_string(),
            "Insufficient data for calculation: need 2 values"
        );
    }
}
