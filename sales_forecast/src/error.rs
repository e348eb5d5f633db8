//! Error types for the sales_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Malformed input series (missing columns, unparseable dates, bad sales values)
    #[error("Data format error: {0}")]
    DataFormatError(String),

    /// Invalid split size, horizon, strategy name or model parameter
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A single strategy failed to fit or predict
    #[error("Fit failure in {strategy}: {reason}")]
    FitFailure { strategy: String, reason: String },

    /// No strategy produced usable metrics
    #[error("Selection failure: {0}")]
    SelectionFailure(String),

    /// An error metric is undefined for the given inputs
    #[error("Metric error: {0}")]
    MetricError(String),

    /// Error from numeric helpers
    #[error("Math error: {0}")]
    MathError(#[from] sales_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from JSON (de)serialization
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ForecastError {
    /// Shorthand for a fit failure of the named strategy
    pub fn fit_failure(strategy: impl Into<String>, reason: impl Into<String>) -> Self {
        ForecastError::FitFailure {
            strategy: strategy.into(),
            reason: reason.into(),
        }
    }

    /// Name of the pipeline stage this error belongs to
    pub fn stage(&self) -> &'static str {
        match self {
            ForecastError::DataFormatError(_)
            | ForecastError::CsvError(_)
            | ForecastError::PolarsError(_)
            | ForecastError::IoError(_) => "load",
            ForecastError::ConfigurationError(_) | ForecastError::SerializationError(_) => {
                "configuration"
            }
            ForecastError::FitFailure { .. } | ForecastError::MathError(_) => "fit",
            ForecastError::MetricError(_) => "evaluation",
            ForecastError::SelectionFailure(_) => "selection",
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}
