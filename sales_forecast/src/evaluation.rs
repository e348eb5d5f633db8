//! Per-strategy metrics and best-model selection

use crate::error::{ForecastError, Result};
use crate::metrics::{Metric, Metrics};
use crate::models::StrategyKind;
use serde::Serialize;
use std::cmp::Ordering;

/// Metrics of one evaluated strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsRecord {
    #[serde(rename = "Model")]
    pub strategy: StrategyKind,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// Strategies split by a MAPE threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdComparison {
    pub threshold: f64,
    pub passing: Vec<StrategyKind>,
    pub failing: Vec<StrategyKind>,
}

/// Metrics of every evaluated strategy in evaluation order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricsTable {
    records: Vec<MetricsRecord>,
}

impl MetricsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store metrics for `strategy`, replacing an earlier evaluation in place
    pub fn insert(&mut self, strategy: StrategyKind, metrics: Metrics) {
        match self.records.iter_mut().find(|r| r.strategy == strategy) {
            Some(record) => record.metrics = metrics,
            None => self.records.push(MetricsRecord { strategy, metrics }),
        }
    }

    /// Drop the metrics of `strategy`, if any
    pub fn remove(&mut self, strategy: StrategyKind) -> Option<Metrics> {
        let pos = self.records.iter().position(|r| r.strategy == strategy)?;
        Some(self.records.remove(pos).metrics)
    }

    pub fn get(&self, strategy: StrategyKind) -> Option<&Metrics> {
        self.records
            .iter()
            .find(|r| r.strategy == strategy)
            .map(|r| &r.metrics)
    }

    pub fn records(&self) -> &[MetricsRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Strategy with the smallest `metric`; exact ties go to the earlier
    /// strategy in [`StrategyKind`] priority order
    pub fn best_model(&self, metric: Metric) -> Result<StrategyKind> {
        self.records
            .iter()
            .min_by(|a, b| {
                a.metrics
                    .get(metric)
                    .partial_cmp(&b.metrics.get(metric))
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.strategy.cmp(&b.strategy))
            })
            .map(|r| r.strategy)
            .ok_or_else(|| {
                ForecastError::SelectionFailure(
                    "no strategy produced usable metrics".to_string(),
                )
            })
    }

    /// Records sorted ascending by `metric`, ties by strategy priority
    pub fn ranked(&self, metric: Metric) -> Vec<MetricsRecord> {
        let mut ranked = self.records.clone();
        ranked.sort_by(|a, b| {
            a.metrics
                .get(metric)
                .partial_cmp(&b.metrics.get(metric))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.strategy.cmp(&b.strategy))
        });
        ranked
    }

    /// Split strategies into MAPE at or below `threshold` and above it
    pub fn compare_against_threshold(&self, threshold: f64) -> ThresholdComparison {
        let (passing, failing): (Vec<&MetricsRecord>, Vec<&MetricsRecord>) = self
            .records
            .iter()
            .partition(|r| r.metrics.mape <= threshold);
        ThresholdComparison {
            threshold,
            passing: passing.into_iter().map(|r| r.strategy).collect(),
            failing: failing.into_iter().map(|r| r.strategy).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn metrics(mape: f64, rmse: f64) -> Metrics {
        Metrics {
            mape,
            wape: mape,
            mae: rmse,
            rmse,
        }
    }

    #[test]
    fn test_best_model_per_metric() {
        let mut table = MetricsTable::new();
        table.insert(StrategyKind::Naive, metrics(12.0, 5.0));
        table.insert(StrategyKind::Arima, metrics(8.0, 9.0));
        assert_eq!(table.best_model(Metric::Mape).unwrap(), StrategyKind::Arima);
        assert_eq!(table.best_model(Metric::Rmse).unwrap(), StrategyKind::Naive);
    }

    #[test]
    fn test_tie_uses_priority_not_insertion_order() {
        let mut table = MetricsTable::new();
        table.insert(StrategyKind::GradientBoosting, metrics(5.0, 1.0));
        table.insert(StrategyKind::RandomForest, metrics(5.0, 1.0));
        assert_eq!(
            table.best_model(Metric::Mape).unwrap(),
            StrategyKind::RandomForest
        );
    }

    #[test]
    fn test_reevaluation_replaces_in_place() {
        let mut table = MetricsTable::new();
        table.insert(StrategyKind::Naive, metrics(12.0, 5.0));
        table.insert(StrategyKind::Arima, metrics(8.0, 9.0));
        table.insert(StrategyKind::Naive, metrics(1.0, 1.0));
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].strategy, StrategyKind::Naive);
        assert_eq!(table.get(StrategyKind::Naive).unwrap().mape, 1.0);
    }

    #[test]
    fn test_empty_table_is_selection_failure() {
        let err = MetricsTable::new().best_model(Metric::Mape).unwrap_err();
        assert!(matches!(err, ForecastError::SelectionFailure(_)));
    }

    #[test]
    fn test_threshold_comparison() {
        let mut table = MetricsTable::new();
        table.insert(StrategyKind::Naive, metrics(12.0, 5.0));
        table.insert(StrategyKind::Arima, metrics(10.0, 9.0));
        let cmp = table.compare_against_threshold(10.0);
        assert_eq!(cmp.passing, vec![StrategyKind::Arima]);
        assert_eq!(cmp.failing, vec![StrategyKind::Naive]);
    }
}
