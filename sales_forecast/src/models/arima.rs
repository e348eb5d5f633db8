//! ARIMA models for monthly sales
//!
//! The series is differenced `d` times and an ARMA(p, q) model is estimated
//! on the result with the Hannan–Rissanen procedure:
//!
//! 1. a long autoregression approximates the unobserved innovations
//! 2. the differenced series is regressed on its own `p` lags and `q` lagged
//!    innovation estimates
//!
//! Both stages are ordinary least squares. Only the training sales are used;
//! engineered features are ignored.

use super::{FittedModel, ForecastModel, ProjectionContext, StrategyKind};
use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use sales_math::least_squares;
use tracing::debug;

const VARIANCE_EPS: f64 = 1e-12;
/// Length of the impulse response used to check stationarity and invertibility
const RESPONSE_STEPS: usize = 1000;
const RESPONSE_TAIL: usize = 100;

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// MA order (q)
    q: usize,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct FittedArima {
    p: usize,
    d: usize,
    q: usize,
    intercept: f64,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Training series
    history: Vec<f64>,
    /// Differenced training series
    differenced: Vec<f64>,
    /// In-sample innovations of the differenced series
    residuals: Vec<f64>,
}

impl ArimaModel {
    /// Create a new ARIMA model
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        if p == 0 && q == 0 {
            return Err(ForecastError::ConfigurationError(
                "ARIMA needs a non-zero AR or MA order".to_string(),
            ));
        }
        Ok(Self { p, d, q })
    }

    pub fn name(&self) -> String {
        format!("ARIMA({},{},{})", self.p, self.d, self.q)
    }

    fn failure(&self, reason: impl Into<String>) -> ForecastError {
        ForecastError::fit_failure(self.name(), reason)
    }

    fn fit_series(&self, series: &[f64]) -> Result<FittedArima> {
        if series.len() <= self.d {
            return Err(self.failure(format!(
                "needs more than {} observations, got {}",
                self.d,
                series.len()
            )));
        }

        let w = difference(series, self.d);
        let n = w.len();
        let with_intercept = self.d == 0;

        let mean = w.iter().sum::<f64>() / n as f64;
        let variance = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        if variance < VARIANCE_EPS {
            return Err(self.failure("differenced series has zero variance"));
        }

        // stage 1: long AR for innovation estimates
        let (long_order, innovations) = if self.q > 0 {
            let m = (self.p + self.q + 1).min(n / 2);
            if m == 0 {
                return Err(self.failure("series too short for innovation estimates"));
            }
            let (coefs, intercept) = self.regress(&w, &[], m, 0, m, with_intercept)?;
            let mut e = vec![0.0; n];
            for t in m..n {
                e[t] = w[t] - intercept - dot_lags(&coefs, &w, t);
            }
            (m, e)
        } else {
            (0, vec![0.0; n])
        };

        // stage 2: ARMA regression
        let start = if self.q > 0 {
            self.p.max(long_order + self.q)
        } else {
            self.p
        };
        let (coefs, intercept) =
            self.regress(&w, &innovations, self.p, self.q, start, with_intercept)?;
        let ar_coefficients = coefs[..self.p].to_vec();
        let ma_coefficients = coefs[self.p..].to_vec();

        if !is_stable(&ar_coefficients) {
            return Err(self.failure("estimated AR part is not stationary"));
        }
        let negated: Vec<f64> = ma_coefficients.iter().map(|t| -t).collect();
        if !is_stable(&negated) {
            return Err(self.failure("estimated MA part is not invertible"));
        }

        let residuals = innovations_of(&w, intercept, &ar_coefficients, &ma_coefficients);
        if residuals.iter().any(|e| !e.is_finite()) {
            return Err(self.failure("residuals are not finite"));
        }

        debug!(
            model = %self.name(),
            intercept,
            ar = ?ar_coefficients,
            ma = ?ma_coefficients,
            "fitted ARIMA"
        );

        Ok(FittedArima {
            p: self.p,
            d: self.d,
            q: self.q,
            intercept,
            ar_coefficients,
            ma_coefficients,
            history: series.to_vec(),
            differenced: w,
            residuals,
        })
    }

    /// Least squares of `w[t]` on `ar` lags of `w` and `ma` lags of `e`, for `t >= start`
    fn regress(
        &self,
        w: &[f64],
        e: &[f64],
        ar: usize,
        ma: usize,
        start: usize,
        with_intercept: bool,
    ) -> Result<(Vec<f64>, f64)> {
        let params = ar + ma + usize::from(with_intercept);
        let rows: Vec<Vec<f64>> = (start..w.len())
            .map(|t| {
                let mut row: Vec<f64> = (1..=ar).map(|i| w[t - i]).collect();
                row.extend((1..=ma).map(|j| e[t - j]));
                if with_intercept {
                    row.push(1.0);
                }
                row
            })
            .collect();

        if rows.len() <= params {
            return Err(self.failure(format!(
                "{} usable observations for {} parameters",
                rows.len(),
                params
            )));
        }

        let target = &w[start..];
        let mut coefs = least_squares::solve(&rows, target)
            .map_err(|err| self.failure(err.to_string()))?;
        let intercept = if with_intercept {
            coefs.pop().unwrap_or(0.0)
        } else {
            0.0
        };
        Ok((coefs, intercept))
    }
}

/// Apply first differences `d` times
fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut out = series.to_vec();
    for _ in 0..d {
        out = out.windows(2).map(|w| w[1] - w[0]).collect();
    }
    out
}

/// `sum_i coefs[i] * values[t - 1 - i]`, skipping lags before the start
fn dot_lags(coefs: &[f64], values: &[f64], t: usize) -> f64 {
    coefs
        .iter()
        .enumerate()
        .filter(|(i, _)| t > *i)
        .map(|(i, c)| c * values[t - 1 - i])
        .sum()
}

/// Conditional innovations with zero pre-sample values
fn innovations_of(w: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in ar.len()..w.len() {
        e[t] = w[t] - intercept - dot_lags(ar, w, t) - dot_lags(ma, &e, t);
    }
    e
}

/// Whether the impulse response of `1 / (1 - sum c_i B^i)` dies out
fn is_stable(coefs: &[f64]) -> bool {
    if coefs.is_empty() {
        return true;
    }
    let mut psi = vec![0.0; RESPONSE_STEPS];
    psi[0] = 1.0;
    for j in 1..RESPONSE_STEPS {
        psi[j] = dot_lags(coefs, &psi, j);
        if !psi[j].is_finite() {
            return false;
        }
    }
    psi[RESPONSE_STEPS - RESPONSE_TAIL..]
        .iter()
        .all(|v| v.abs() < 1.0)
}

impl FittedArima {
    pub fn order(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Multi-step forecast from the end of the training series
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();
        for _ in 0..horizon {
            let t = w.len();
            let next = self.intercept
                + dot_lags(&self.ar_coefficients, &w, t)
                + dot_lags(&self.ma_coefficients, &e, t);
            w.push(next);
            e.push(0.0);
        }
        let mut forecast = w.split_off(self.differenced.len());

        // undo each level of differencing, innermost first
        for level in (0..self.d).rev() {
            let base = difference(&self.history, level);
            let mut last = base.last().copied().unwrap_or(0.0);
            for value in forecast.iter_mut() {
                last += *value;
                *value = last;
            }
        }

        if forecast.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::fit_failure(
                StrategyKind::Arima.name(),
                "forecast is not finite",
            ));
        }
        Ok(forecast)
    }
}

impl ForecastModel for ArimaModel {
    type Fitted = FittedArima;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Arima
    }

    fn fit(&self, train: &FeatureTable, _feature_columns: &[String]) -> Result<FittedArima> {
        self.fit_series(&train.sales())
    }
}

impl FittedModel for FittedArima {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Arima
    }

    fn predict(&self, test: &FeatureTable) -> Result<Vec<f64>> {
        self.forecast(test.len())
    }

    /// Forecasts from the end of the training window; the model is not refitted
    fn project(&self, horizon: usize, _context: &ProjectionContext<'_>) -> Result<Vec<f64>> {
        self.forecast(horizon)
    }
}
