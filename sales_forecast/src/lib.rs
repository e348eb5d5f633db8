//! # Sales Forecast
//!
//! A Rust library for monthly sales forecasting and model comparison.
//!
//! ## Features
//!
//! - Monthly series loading from CSV or a Polars `DataFrame`
//! - Feature engineering (lags, calendar, season indicators, rolling statistics)
//! - Chronological train/test split
//! - Forecasting strategies (Naive, Seasonal Naive, ARIMA, Random Forest, Gradient Boosting)
//! - Error metrics (MAPE, WAPE, MAE, RMSE) and best-model selection
//! - Future projection with a symmetric band
//! - CSV export and narrative summaries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sales_forecast::{ForecastConfig, ForecastSession, Metric};
//!
//! let mut session = ForecastSession::from_csv("monthly_sales.csv", ForecastConfig::default())?;
//! session.run_all()?;
//!
//! let best = session.best_model(Metric::Mape)?;
//! let forecast = session.forecast_future(best, 3)?;
//! for point in &forecast.points {
//!     println!("{}: {:.0} ({:.0} - {:.0})", point.month, point.predicted_sales, point.lower, point.upper);
//! }
//! # Ok::<(), sales_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod features;
pub mod insight;
pub mod metrics;
pub mod models;
pub mod projection;
pub mod session;
pub mod split;

// Re-export commonly used types
pub use crate::config::ForecastConfig;
pub use crate::data::{DataLoader, SeriesSummary, TimeSeries};
pub use crate::error::{ForecastError, Result};
pub use crate::evaluation::MetricsTable;
pub use crate::features::{build_features, FeatureTable};
pub use crate::insight::{InsightGenerator, InsightService, TemplateInsight};
pub use crate::metrics::{Metric, Metrics};
pub use crate::models::{run_strategy, StrategyKind, StrategyRun};
pub use crate::projection::{FutureForecast, FuturePoint};
pub use crate::session::{AnalysisReport, ForecastSession};
pub use crate::split::{split, Split};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
