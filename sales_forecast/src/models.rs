//! Forecasting strategies for monthly sales
//!
//! Every strategy follows the same two-step contract: [`ForecastModel::fit`]
//! produces an owned fitted artifact, and the artifact predicts the holdout
//! window ([`FittedModel::predict`]) or projects past the end of the series
//! ([`FittedModel::project`]). [`Strategy`] and [`FittedStrategy`] dispatch
//! over the concrete models so a session can hold them side by side.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;
use std::str::FromStr;
use tracing::{debug, warn};

pub mod arima;
pub mod gradient_boosting;
pub mod naive;
pub mod random_forest;
pub mod seasonal_naive;
pub mod tree;

use arima::{ArimaModel, FittedArima};
use gradient_boosting::{FittedGradientBoosting, GradientBoostingModel};
use naive::{FittedNaive, NaiveModel};
use random_forest::{FittedRandomForest, RandomForestModel};
use seasonal_naive::{FittedSeasonalNaive, SeasonalNaiveModel};

/// Identifier of a forecasting strategy
///
/// The declaration order is the priority used to break ties between
/// strategies with identical scores.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum StrategyKind {
    #[serde(rename = "Naive")]
    Naive,
    #[serde(rename = "Seasonal_Naive")]
    SeasonalNaive,
    #[serde(rename = "ARIMA")]
    Arima,
    #[serde(rename = "Random_Forest")]
    RandomForest,
    #[serde(rename = "Gradient_Boosting", alias = "XGBoost")]
    GradientBoosting,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Naive,
        StrategyKind::SeasonalNaive,
        StrategyKind::Arima,
        StrategyKind::RandomForest,
        StrategyKind::GradientBoosting,
    ];

    /// Display name, also used as the `Model` column in exports
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Naive => "Naive",
            StrategyKind::SeasonalNaive => "Seasonal_Naive",
            StrategyKind::Arima => "ARIMA",
            StrategyKind::RandomForest => "Random_Forest",
            StrategyKind::GradientBoosting => "Gradient_Boosting",
        }
    }

    /// Whether the strategy is trained on the engineered feature columns
    pub fn uses_features(self) -> bool {
        matches!(
            self,
            StrategyKind::RandomForest | StrategyKind::GradientBoosting
        )
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        let kind = match key.as_str() {
            "naive" => StrategyKind::Naive,
            "seasonal_naive" => StrategyKind::SeasonalNaive,
            "arima" => StrategyKind::Arima,
            "random_forest" | "randomforest" | "rf" => StrategyKind::RandomForest,
            "gradient_boosting" | "gradientboosting" | "xgboost" | "gbm" => {
                StrategyKind::GradientBoosting
            }
            _ => {
                return Err(ForecastError::ConfigurationError(format!(
                    "unknown strategy '{}'",
                    s
                )))
            }
        };
        Ok(kind)
    }
}

/// Read-only view of the full history used for future projection
#[derive(Debug, Clone, Copy)]
pub struct ProjectionContext<'a> {
    table: &'a FeatureTable,
}

impl<'a> ProjectionContext<'a> {
    pub fn new(table: &'a FeatureTable) -> Self {
        Self { table }
    }

    /// Full sales history in chronological order
    pub fn history(&self) -> Vec<f64> {
        self.table.sales()
    }

    /// Final observed sales value
    pub fn last_observed(&self) -> Result<f64> {
        self.table
            .rows()
            .last()
            .map(|r| r.sales)
            .ok_or_else(|| ForecastError::DataFormatError("history is empty".to_string()))
    }

    /// Final historical feature row restricted to `columns`
    pub fn last_feature_vector(&self, columns: &[String]) -> Result<Vec<f64>> {
        self.table.last_feature_vector(columns)
    }
}

/// Trained artifact of a forecasting strategy
pub trait FittedModel: Debug {
    /// Strategy that produced the artifact
    fn kind(&self) -> StrategyKind;

    /// Predict one value per row of the holdout table
    fn predict(&self, test: &FeatureTable) -> Result<Vec<f64>>;

    /// Predict `horizon` months past the end of the history
    fn project(&self, horizon: usize, context: &ProjectionContext<'_>) -> Result<Vec<f64>>;
}

/// Forecasting strategy that can be trained on a feature table
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Fitted: FittedModel;

    fn kind(&self) -> StrategyKind;

    /// Train on the given rows; `feature_columns` is ignored by univariate models
    fn fit(&self, train: &FeatureTable, feature_columns: &[String]) -> Result<Self::Fitted>;

    /// Train, then predict the holdout window
    fn fit_predict(
        &self,
        train: &FeatureTable,
        test: &FeatureTable,
        feature_columns: &[String],
    ) -> Result<(Self::Fitted, Vec<f64>)> {
        let fitted = self.fit(train, feature_columns)?;
        let predictions = fitted.predict(test)?;
        check_predictions(self.kind(), &predictions, test.len())?;
        Ok((fitted, predictions))
    }
}

/// Reject predictions of the wrong length or with non-finite values
pub(crate) fn check_predictions(
    kind: StrategyKind,
    predictions: &[f64],
    expected: usize,
) -> Result<()> {
    if predictions.len() != expected {
        return Err(ForecastError::fit_failure(
            kind.name(),
            format!(
                "produced {} predictions for {} rows",
                predictions.len(),
                expected
            ),
        ));
    }
    if predictions.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::fit_failure(
            kind.name(),
            "produced non-finite predictions",
        ));
    }
    Ok(())
}

/// A configured strategy ready to be trained
#[derive(Debug, Clone)]
pub enum Strategy {
    Naive(NaiveModel),
    SeasonalNaive(SeasonalNaiveModel),
    Arima(ArimaModel),
    RandomForest(RandomForestModel),
    GradientBoosting(GradientBoostingModel),
}

impl Strategy {
    /// Build the strategy `kind` with the parameters from `config`
    pub fn from_config(kind: StrategyKind, config: &ForecastConfig) -> Result<Self> {
        let strategy = match kind {
            StrategyKind::Naive => Strategy::Naive(NaiveModel::new()),
            StrategyKind::SeasonalNaive => Strategy::SeasonalNaive(SeasonalNaiveModel::new(
                config.seasonal_naive.season_length,
            )?),
            StrategyKind::Arima => {
                let order = config.arima;
                Strategy::Arima(ArimaModel::new(order.p, order.d, order.q)?)
            }
            StrategyKind::RandomForest => {
                Strategy::RandomForest(RandomForestModel::from_config(&config.random_forest)?)
            }
            StrategyKind::GradientBoosting => Strategy::GradientBoosting(
                GradientBoostingModel::from_config(&config.gradient_boosting)?,
            ),
        };
        Ok(strategy)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Naive(m) => m.kind(),
            Strategy::SeasonalNaive(m) => m.kind(),
            Strategy::Arima(m) => m.kind(),
            Strategy::RandomForest(m) => m.kind(),
            Strategy::GradientBoosting(m) => m.kind(),
        }
    }

    /// Train and predict the holdout window
    pub fn fit_predict(
        &self,
        train: &FeatureTable,
        test: &FeatureTable,
        feature_columns: &[String],
    ) -> Result<(FittedStrategy, Vec<f64>)> {
        match self {
            Strategy::Naive(m) => m
                .fit_predict(train, test, feature_columns)
                .map(|(f, p)| (FittedStrategy::Naive(f), p)),
            Strategy::SeasonalNaive(m) => m
                .fit_predict(train, test, feature_columns)
                .map(|(f, p)| (FittedStrategy::SeasonalNaive(f), p)),
            Strategy::Arima(m) => m
                .fit_predict(train, test, feature_columns)
                .map(|(f, p)| (FittedStrategy::Arima(f), p)),
            Strategy::RandomForest(m) => m
                .fit_predict(train, test, feature_columns)
                .map(|(f, p)| (FittedStrategy::RandomForest(f), p)),
            Strategy::GradientBoosting(m) => m
                .fit_predict(train, test, feature_columns)
                .map(|(f, p)| (FittedStrategy::GradientBoosting(f), p)),
        }
    }
}

/// Fitted artifact of any strategy, owned by one session
#[derive(Debug, Clone)]
pub enum FittedStrategy {
    Naive(FittedNaive),
    SeasonalNaive(FittedSeasonalNaive),
    Arima(FittedArima),
    RandomForest(FittedRandomForest),
    GradientBoosting(FittedGradientBoosting),
    /// The strategy failed and the naive baseline stands in for it
    Fallback {
        kind: StrategyKind,
        naive: FittedNaive,
    },
}

impl FittedStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            FittedStrategy::Naive(f) => f.kind(),
            FittedStrategy::SeasonalNaive(f) => f.kind(),
            FittedStrategy::Arima(f) => f.kind(),
            FittedStrategy::RandomForest(f) => f.kind(),
            FittedStrategy::GradientBoosting(f) => f.kind(),
            FittedStrategy::Fallback { kind, .. } => *kind,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FittedStrategy::Fallback { .. })
    }

    /// Project `horizon` months past the end of the history
    pub fn project(&self, horizon: usize, context: &ProjectionContext<'_>) -> Result<Vec<f64>> {
        match self {
            FittedStrategy::Naive(f) => f.project(horizon, context),
            FittedStrategy::SeasonalNaive(f) => f.project(horizon, context),
            FittedStrategy::Arima(f) => f.project(horizon, context),
            FittedStrategy::RandomForest(f) => f.project(horizon, context),
            FittedStrategy::GradientBoosting(f) => f.project(horizon, context),
            FittedStrategy::Fallback { naive, .. } => naive.project(horizon, context),
        }
    }

    /// Normalised feature importances of the tree ensembles
    pub fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        match self {
            FittedStrategy::RandomForest(f) => Some(f.feature_importances()),
            FittedStrategy::GradientBoosting(f) => Some(f.feature_importances()),
            _ => None,
        }
    }
}

/// A strategy failure that was recovered by the naive fallback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyFailure {
    pub strategy: StrategyKind,
    pub stage: String,
    pub reason: String,
}

/// Outcome of training one strategy
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub kind: StrategyKind,
    pub predictions: Vec<f64>,
    pub fitted: FittedStrategy,
    pub failure: Option<StrategyFailure>,
}

/// Train `kind` on `train` and predict `test`
///
/// Configuration problems are returned as errors. A failure inside the
/// strategy itself is logged, recorded in [`StrategyRun::failure`] and
/// replaced by the naive baseline's predictions.
pub fn run_strategy(
    kind: StrategyKind,
    train: &FeatureTable,
    test: &FeatureTable,
    feature_columns: &[String],
    config: &ForecastConfig,
) -> Result<StrategyRun> {
    if train.is_empty() || test.is_empty() {
        return Err(ForecastError::ConfigurationError(
            "train and test tables must both be non-empty".to_string(),
        ));
    }

    let strategy = Strategy::from_config(kind, config)?;

    match strategy.fit_predict(train, test, feature_columns) {
        Ok((fitted, predictions)) => {
            debug!(strategy = %kind, predictions = ?predictions, "strategy trained");
            Ok(StrategyRun {
                kind,
                predictions,
                fitted,
                failure: None,
            })
        }
        Err(err @ ForecastError::ConfigurationError(_)) => Err(err),
        Err(err) => {
            warn!(strategy = %kind, error = %err, "strategy failed, using naive fallback");
            let (naive, predictions) = NaiveModel::new().fit_predict(train, test, feature_columns)?;
            Ok(StrategyRun {
                kind,
                predictions,
                fitted: FittedStrategy::Fallback { kind, naive },
                failure: Some(StrategyFailure {
                    strategy: kind,
                    stage: err.stage().to_string(),
                    reason: err.to_string(),
                }),
            })
        }
    }
}
