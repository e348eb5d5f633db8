//! Seasonal naive baseline: the value one season back
//!
//! A window shorter than one season degrades to the naive last value.

use super::{FittedModel, ForecastModel, ProjectionContext, StrategyKind};
use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;

/// Predicts the training value `season_length` steps before the end
#[derive(Debug, Clone)]
pub struct SeasonalNaiveModel {
    season_length: usize,
}

impl SeasonalNaiveModel {
    pub fn new(season_length: usize) -> Result<Self> {
        if season_length == 0 {
            return Err(ForecastError::ConfigurationError(
                "season length must be positive".to_string(),
            ));
        }
        Ok(Self { season_length })
    }

    pub fn season_length(&self) -> usize {
        self.season_length
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedSeasonalNaive {
    season_length: usize,
    seasonal_value: f64,
}

impl FittedSeasonalNaive {
    /// Value repeated over the holdout
    pub fn seasonal_value(&self) -> f64 {
        self.seasonal_value
    }

    pub fn season_length(&self) -> usize {
        self.season_length
    }
}

/// `values[len - season_length]`, or the last value when the series is shorter
fn value_one_season_back(values: &[f64], season_length: usize) -> Option<f64> {
    match values.len().checked_sub(season_length) {
        Some(i) => values.get(i).copied(),
        None => values.last().copied(),
    }
}

impl ForecastModel for SeasonalNaiveModel {
    type Fitted = FittedSeasonalNaive;

    fn kind(&self) -> StrategyKind {
        StrategyKind::SeasonalNaive
    }

    fn fit(&self, train: &FeatureTable, _feature_columns: &[String]) -> Result<Self::Fitted> {
        let seasonal_value = value_one_season_back(&train.sales(), self.season_length)
            .ok_or_else(|| {
                ForecastError::fit_failure(self.kind().name(), "training window is empty")
            })?;
        Ok(FittedSeasonalNaive {
            season_length: self.season_length,
            seasonal_value,
        })
    }
}

impl FittedModel for FittedSeasonalNaive {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SeasonalNaive
    }

    fn predict(&self, test: &FeatureTable) -> Result<Vec<f64>> {
        Ok(vec![self.seasonal_value; test.len()])
    }

    /// Future months repeat the last observed value
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

    fn table(values: Vec<f64>) -> FeatureTable {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        build_features(&TimeSeries::from_values(start, values).unwrap()).unwrap()
    }

    #[test]
    fn test_predicts_value_one_season_back() {
        let t = table(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let s = split(&t, 4).unwrap();
        let model = SeasonalNaiveModel::new(3).unwrap();
        let (fitted, predictions) = model.fit_predict(&s.train, &s.test, &[]).unwrap();
        assert_eq!(predictions, vec![2.0; 4]);
        assert_eq!(fitted.seasonal_value(), 2.0);

        let context = ProjectionContext::new(&t);
        assert_eq!(fitted.project(4, &context).unwrap(), vec![8.0; 4]);
    }

    #[test]
    fn test_short_training_window_uses_last_value() {
        let t = table(vec![1.0, 2.0, 3.0, 4.0]);
        let s = split(&t, 2).unwrap();
        let fitted = SeasonalNaiveModel::new(3).unwrap().fit(&s.train, &[]).unwrap();
        assert_eq!(fitted.predict(&s.test).unwrap(), vec![2.0, 2.0]);
        assert!(SeasonalNaiveModel::new(0).is_err());
    }
}
