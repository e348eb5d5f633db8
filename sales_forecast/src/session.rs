//! Analysis session: one series from features to future projection
//!
//! A [`ForecastSession`] owns everything derived from a single series. Each
//! caller works on its own session, so concurrent analyses share no state.

use crate::config::ForecastConfig;
use crate::data::{DataLoader, SeriesSummary, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::evaluation::{MetricsTable, ThresholdComparison};
use crate::features::{FeaturePipeline, FeatureTable};
use crate::metrics::{Metric, Metrics};
use crate::models::{self, StrategyFailure, StrategyKind, StrategyRun};
use crate::projection::{self, FutureForecast};
use crate::split::{self, Split};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Complete outcome of an analysis, ready to serialise
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub summary: SeriesSummary,
    pub test_horizon: usize,
    pub selection_metric: Metric,
    pub metrics: MetricsTable,
    pub best_model: StrategyKind,
    pub threshold: ThresholdComparison,
    pub failures: Vec<StrategyFailure>,
    pub forecast: FutureForecast,
    /// Importances of the best model when it is a tree ensemble
    pub feature_importances: Option<Vec<(String, f64)>>,
}

/// State of one forecasting analysis
#[derive(Debug, Clone)]
pub struct ForecastSession {
    config: ForecastConfig,
    series: TimeSeries,
    features: FeatureTable,
    split: Option<Split>,
    runs: Vec<StrategyRun>,
    metrics: MetricsTable,
    failures: Vec<StrategyFailure>,
}

impl ForecastSession {
    /// Validate `config` and build the feature table for `series`
    pub fn start(series: TimeSeries, config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let features = FeaturePipeline::new(config.features.clone())?.build(&series)?;
        info!(
            months = series.len(),
            features = features.feature_columns().len(),
            "started forecast session"
        );
        Ok(Self {
            config,
            series,
            features,
            split: None,
            runs: Vec::new(),
            metrics: MetricsTable::new(),
            failures: Vec::new(),
        })
    }

    /// Load a CSV series and start a session on it
    pub fn from_csv<P: AsRef<Path>>(path: P, config: ForecastConfig) -> Result<Self> {
        Self::start(DataLoader::from_csv(path)?, config)
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    /// Descriptive statistics of the loaded series
    pub fn summary(&self) -> Result<SeriesSummary> {
        self.series.summary()
    }

    /// Hold out the last `k` months; earlier runs and metrics are discarded
    pub fn split(&mut self, k: usize) -> Result<&Split> {
        let new_split = split::split(&self.features, k)?;
        self.runs.clear();
        self.metrics = MetricsTable::new();
        self.failures.clear();
        Ok(&*self.split.insert(new_split))
    }

    /// Split with the configured test horizon unless already split
    fn ensure_split(&mut self) -> Result<()> {
        if self.split.is_none() {
            self.split(self.config.test_horizon)?;
        }
        Ok(())
    }

    pub fn current_split(&self) -> Option<&Split> {
        self.split.as_ref()
    }

    /// Train `kind` on the training window and predict the holdout
    pub fn run_strategy(&mut self, kind: StrategyKind) -> Result<&StrategyRun> {
        self.ensure_split()?;
        let split = self
            .split
            .as_ref()
            .ok_or_else(|| ForecastError::ConfigurationError("no train/test split".to_string()))?;
        let run = models::run_strategy(
            kind,
            &split.train,
            &split.test,
            self.features.feature_columns(),
            &self.config,
        )?;

        self.failures.retain(|f| f.strategy != kind);
        if let Some(failure) = &run.failure {
            self.failures.push(failure.clone());
        }

        let slot = match self.runs.iter().position(|r| r.kind == kind) {
            Some(pos) => {
                self.runs[pos] = run;
                pos
            }
            None => {
                self.runs.push(run);
                self.runs.len() - 1
            }
        };
        Ok(&self.runs[slot])
    }

    /// Holdout predictions of a trained strategy
    pub fn predictions(&self, kind: StrategyKind) -> Option<&[f64]> {
        self.run(kind).map(|r| r.predictions.as_slice())
    }

    pub fn run(&self, kind: StrategyKind) -> Option<&StrategyRun> {
        self.runs.iter().find(|r| r.kind == kind)
    }

    /// Score a trained strategy against the holdout actuals
    ///
    /// A strategy whose metrics are undefined is recorded as failed and
    /// removed from the metrics table.
    pub fn evaluate(&mut self, kind: StrategyKind) -> Result<Metrics> {
        let split = self.split.as_ref().ok_or_else(|| {
            ForecastError::ConfigurationError("split the series before evaluating".to_string())
        })?;
        let run = self.runs.iter().find(|r| r.kind == kind).ok_or_else(|| {
            ForecastError::ConfigurationError(format!("strategy {} has not been run", kind))
        })?;

        match Metrics::compute(&split.actuals(), &run.predictions) {
            Ok(metrics) => {
                self.metrics.insert(kind, metrics);
                Ok(metrics)
            }
            Err(err) => {
                warn!(strategy = %kind, error = %err, "strategy excluded from selection");
                self.metrics.remove(kind);
                self.failures.retain(|f| !(f.strategy == kind && f.stage == err.stage()));
                self.failures.push(StrategyFailure {
                    strategy: kind,
                    stage: err.stage().to_string(),
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Run and evaluate every configured strategy in order
    pub fn run_all(&mut self) -> Result<&MetricsTable> {
        self.ensure_split()?;
        for kind in self.config.strategies.clone() {
            self.run_strategy(kind)?;
            // evaluation failures are recorded; the remaining strategies still run
            let _ = self.evaluate(kind);
        }

        if self.metrics.is_empty() {
            return Err(ForecastError::SelectionFailure(
                "no strategy produced usable metrics".to_string(),
            ));
        }
        info!(
            evaluated = self.metrics.len(),
            failed = self.failures.len(),
            "evaluated strategies"
        );
        Ok(&self.metrics)
    }

    pub fn metrics(&self) -> &MetricsTable {
        &self.metrics
    }

    /// Strategy with the lowest `metric`
    pub fn best_model(&self, metric: Metric) -> Result<StrategyKind> {
        self.metrics.best_model(metric)
    }

    /// Best strategy by the configured selection metric
    pub fn selected_model(&self) -> Result<StrategyKind> {
        self.best_model(self.config.selection_metric)
    }

    /// Project `months` past the last observed month with a trained strategy
    pub fn forecast_future(&self, kind: StrategyKind, months: usize) -> Result<FutureForecast> {
        self.config.check_forecast_horizon(months)?;
        let run = self.run(kind).ok_or_else(|| {
            ForecastError::ConfigurationError(format!("strategy {} has not been run", kind))
        })?;
        projection::project(&run.fitted, &self.features, months, self.config.confidence_z)
    }

    /// Failures recovered by fallback or excluded from selection
    pub fn failures(&self) -> &[StrategyFailure] {
        &self.failures
    }

    /// Run everything and project `months` with the best strategy
    pub fn report(&mut self, months: usize) -> Result<AnalysisReport> {
        if self.metrics.is_empty() {
            self.run_all()?;
        }
        let metric = self.config.selection_metric;
        let best_model = self.best_model(metric)?;
        let forecast = self.forecast_future(best_model, months)?;
        info!(best = %best_model, metric = %metric, "selected best model");

        Ok(AnalysisReport {
            summary: self.summary()?,
            test_horizon: self.split.as_ref().map_or(0, Split::test_len),
            selection_metric: metric,
            metrics: self.metrics.clone(),
            best_model,
            threshold: self
                .metrics
                .compare_against_threshold(self.config.mape_threshold),
            failures: self.failures.clone(),
            forecast,
            feature_importances: self
                .run(best_model)
                .and_then(|r| r.fitted.feature_importances()),
        })
    }
}
