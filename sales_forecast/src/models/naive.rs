//! Naive baseline: repeat the last observed value

use super::{FittedModel, ForecastModel, ProjectionContext, StrategyKind};
use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;

/// Last-value forecaster
#[derive(Debug, Clone, Default)]
pub struct NaiveModel;

impl NaiveModel {
    pub fn new() -> Self {
        Self
    }
}

/// Naive model fitted on a training window
#[derive(Debug, Clone, PartialEq)]
pub struct FittedNaive {
    last_value: f64,
}

impl FittedNaive {
    /// Final training value repeated by [`FittedModel::predict`]
    pub fn last_value(&self) -> f64 {
        self.last_value
    }
}

impl ForecastModel for NaiveModel {
    type Fitted = FittedNaive;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Naive
    }

    fn fit(&self, train: &FeatureTable, _feature_columns: &[String]) -> Result<FittedNaive> {
        let last = train.rows().last().ok_or_else(|| {
            ForecastError::fit_failure(self.kind().name(), "training window is empty")
        })?;
        Ok(FittedNaive {
            last_value: last.sales,
        })
    }
}

impl FittedModel for FittedNaive {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Naive
    }

    fn predict(&self, test: &FeatureTable) -> Result<Vec<f64>> {
        Ok(vec![self.last_value; test.len()])
    }

    /// Repeats the last value of the full history, not of the training window
    fn project(&self, horizon: usize, context: &ProjectionContext<'_>) -> Result<Vec<f64>> {
        Ok(vec![context.last_observed()?; horizon])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeSeries;
    use crate::features::build_features;
    use crate::split::split;
    use chrono::NaiveDate;

    #[test]
    fn test_naive_predict_and_project() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let series = TimeSeries::from_values(start, vec![10.0, 12.0, 15.0, 11.0, 9.0]).unwrap();
        let table = build_features(&series).unwrap();
        let s = split(&table, 2).unwrap();

        let (fitted, predictions) = NaiveModel::new()
            .fit_predict(&s.train, &s.test, table.feature_columns())
            .unwrap();
        assert_eq!(predictions, vec![15.0, 15.0]);

        let context = ProjectionContext::new(&table);
        assert_eq!(fitted.project(3, &context).unwrap(), vec![9.0; 3]);
    }
}
