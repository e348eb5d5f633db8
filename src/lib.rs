//! # Sales Forecast Workspace
//!
//! Umbrella crate re-exporting the workspace members:
//!
//! - [`sales_forecast`]: series loading, feature engineering, strategies,
//!   evaluation, projection and export
//! - [`sales_math`]: statistics, rolling windows and least squares
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use sales_forecast_workspace::forecast::{ForecastConfig, ForecastSession, StrategyKind, TimeSeries};
//!
//! let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
//! let sales = vec![100.0, 110.0, 105.0, 130.0, 150.0, 170.0, 190.0, 200.0, 180.0, 160.0, 140.0, 120.0];
//! let series = TimeSeries::from_values(start, sales).unwrap();
//!
//! let mut session = ForecastSession::start(series, ForecastConfig::default()).unwrap();
//! session.split(3).unwrap();
//! let run = session.run_strategy(StrategyKind::Naive).unwrap();
//! assert_eq!(run.predictions, vec![180.0, 180.0, 180.0]);
//! ```

pub use sales_forecast as forecast;
pub use sales_math as math;

/// Crate versions of the workspace members
pub fn versions() -> [(&'static str, &'static str); 2] {
    [
        (sales_forecast::NAME, sales_forecast::VERSION),
        (sales_math::NAME, sales_math::VERSION),
    ]
}
