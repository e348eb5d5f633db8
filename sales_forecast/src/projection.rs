//! Future projection past the end of the observed series

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::models::{FittedStrategy, ProjectionContext, StrategyKind};
use chrono::{Months, NaiveDate};
use serde::Serialize;
use tracing::debug;

/// The `k` calendar months following `last`
pub fn future_months(last: NaiveDate, k: usize) -> Result<Vec<NaiveDate>> {
    (1..=k)
        .map(|i| {
            u32::try_from(i)
                .ok()
                .and_then(|i| last.checked_add_months(Months::new(i)))
                .ok_or_else(|| {
                    ForecastError::ConfigurationError(format!(
                        "cannot project {} months past {}",
                        k, last
                    ))
                })
        })
        .collect()
}

/// One projected month with its symmetric band
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuturePoint {
    #[serde(rename = "Month")]
    pub month: NaiveDate,
    #[serde(rename = "Predicted_Sales")]
    pub predicted_sales: f64,
    #[serde(rename = "Lower")]
    pub lower: f64,
    #[serde(rename = "Upper")]
    pub upper: f64,
}

/// Projection of one strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FutureForecast {
    pub strategy: StrategyKind,
    /// Half-width of the band: `z` times the historical standard deviation
    pub band: f64,
    pub points: Vec<FuturePoint>,
}

impl FutureForecast {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn months(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.month).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted_sales).collect()
    }
}

/// Project `horizon` months with `fitted`, banded by `z` × sample std of the history
///
/// The band is a naive symmetric interval, not one derived from the model.
pub fn project(
    fitted: &FittedStrategy,
    history: &FeatureTable,
    horizon: usize,
    z: f64,
) -> Result<FutureForecast> {
    let last = history
        .rows()
        .last()
        .map(|r| r.month)
        .ok_or_else(|| ForecastError::DataFormatError("history is empty".to_string()))?;
    let months = future_months(last, horizon)?;

    let context = ProjectionContext::new(history);
    let values = fitted.project(horizon, &context)?;
    if values.len() != horizon {
        return Err(ForecastError::fit_failure(
            fitted.kind().name(),
            format!("projected {} values for {} months", values.len(), horizon),
        ));
    }

    let band = z * sales_math::sample_std_dev(&history.sales())?;
    debug!(strategy = %fitted.kind(), horizon, band, "projected future months");

    Ok(FutureForecast {
        strategy: fitted.kind(),
        band,
        points: months
            .into_iter()
            .zip(values)
            .map(|(month, predicted_sales)| FuturePoint {
                month,
                predicted_sales,
                lower: predicted_sales - band,
                upper: predicted_sales + band,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_future_months_cross_year() {
        let months = future_months(date(2023, 11), 3).unwrap();
        assert_eq!(months, vec![date(2023, 12), date(2024, 1), date(2024, 2)]);
        assert!(future_months(date(2023, 11), 0).unwrap().is_empty());
    }
}
