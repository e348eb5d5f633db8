//! Chronological train/test splitting

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use tracing::debug;

/// Train prefix and holdout suffix of a feature table
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: FeatureTable,
    pub test: FeatureTable,
}

impl Split {
    /// Holdout size
    pub fn test_len(&self) -> usize {
        self.test.len()
    }

    /// Sales of the holdout months
    pub fn actuals(&self) -> Vec<f64> {
        self.test.sales()
    }
}

/// Hold out the last `k` rows; `1 <= k < len` is required
pub fn split(table: &FeatureTable, k: usize) -> Result<Split> {
    if k < 1 || k >= table.len() {
        return Err(ForecastError::ConfigurationError(format!(
            "test size must be between 1 and {} for a table of {} rows, got {}",
            table.len().saturating_sub(1),
            table.len(),
            k
        )));
    }

    let cut = table.len() - k;
    debug!(train = cut, test = k, "split feature table");

    Ok(Split {
        train: table.slice(0, cut),
        test: table.slice(cut, table.len()),
    })
}
