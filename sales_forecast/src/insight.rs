//! Narrative summaries of an analysis
//!
//! Text generation is pluggable through [`InsightGenerator`]. The
//! deterministic [`TemplateInsight`] is always available, and
//! [`InsightService`] falls back to it whenever an external generator is
//! missing or fails.

use crate::error::{ForecastError, Result};
use crate::evaluation::MetricsTable;
use crate::models::StrategyKind;
use crate::session::ForecastSession;
use std::fmt::Write as _;
use tracing::warn;

/// Everything a generator may talk about
#[derive(Debug, Clone, PartialEq)]
pub struct InsightContext {
    pub metrics: MetricsTable,
    pub best_model: StrategyKind,
    /// Holdout actuals
    pub actuals: Vec<f64>,
    /// Holdout predictions per strategy, in evaluation order
    pub predictions: Vec<(StrategyKind, Vec<f64>)>,
}

impl InsightContext {
    /// Context of an evaluated session, with the best model by its selection metric
    pub fn from_session(session: &ForecastSession) -> Result<Self> {
        let best_model = session.selected_model()?;
        let actuals = session
            .current_split()
            .map(|s| s.actuals())
            .ok_or_else(|| {
                ForecastError::ConfigurationError("session has no evaluated split".to_string())
            })?;
        let predictions = session
            .metrics()
            .records()
            .iter()
            .filter_map(|r| {
                session
                    .predictions(r.strategy)
                    .map(|p| (r.strategy, p.to_vec()))
            })
            .collect();

        Ok(Self {
            metrics: session.metrics().clone(),
            best_model,
            actuals,
            predictions,
        })
    }

    /// Plain-text digest handed to external generators
    pub fn prompt(&self) -> String {
        let mut out = String::from("Model performance metrics:\n");
        for record in self.metrics.records() {
            let m = record.metrics;
            let _ = writeln!(
                out,
                "{}: MAPE {:.2}%, WAPE {:.2}%, MAE {:.2}, RMSE {:.2}",
                record.strategy, m.mape, m.wape, m.mae, m.rmse
            );
        }
        let _ = writeln!(out, "\nBest model: {}", self.best_model);

        if !self.actuals.is_empty() {
            let avg = self.actuals.iter().sum::<f64>() / self.actuals.len() as f64;
            let _ = writeln!(out, "\nActual sales (holdout): {:?}", self.actuals);
            let _ = writeln!(out, "Average: {:.2}", avg);
            let _ = writeln!(out, "Trend: {}", trend_word(&self.actuals));
        }

        out.push_str("\nPredictions:\n");
        for (kind, values) in &self.predictions {
            let mape = self
                .metrics
                .get(*kind)
                .map_or_else(|| "N/A".to_string(), |m| format!("{:.2}%", m.mape));
            let _ = writeln!(out, "- {}: {:?} (MAPE: {})", kind, values, mape);
        }
        out
    }
}

fn trend_word(values: &[f64]) -> &'static str {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if last > first => "Increasing",
        _ => "Decreasing",
    }
}

/// Produces narrative text from an [`InsightContext`]
pub trait InsightGenerator {
    fn generate(&self, context: &InsightContext) -> Result<String>;
}

/// Deterministic Markdown report built only from the numbers
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateInsight;

impl InsightGenerator for TemplateInsight {
    fn generate(&self, context: &InsightContext) -> Result<String> {
        let best = context.metrics.get(context.best_model).ok_or_else(|| {
            ForecastError::SelectionFailure(format!(
                "no metrics recorded for {}",
                context.best_model
            ))
        })?;

        let mut out = String::new();
        let _ = writeln!(out, "## Forecasting Analysis Report\n");
        let _ = writeln!(out, "### Best Model: {}\n", context.best_model);
        let _ = writeln!(out, "**Performance Metrics:**");
        let _ = writeln!(out, "- MAPE: {:.2}%", best.mape);
        let _ = writeln!(out, "- WAPE: {:.2}%", best.wape);
        let _ = writeln!(out, "- MAE: {:.2}", best.mae);
        let _ = writeln!(out, "- RMSE: {:.2}\n", best.rmse);
        let _ = writeln!(
            out,
            "The {} model achieved the best performance with a MAPE of {:.2}%. \
             On average its predictions deviate by {:.2}% from actual values.\n",
            context.best_model, best.mape, best.mape
        );

        let _ = writeln!(out, "**Model Comparison:**");
        for record in context.metrics.records() {
            let _ = writeln!(
                out,
                "- **{}**: MAPE {:.2}%, WAPE {:.2}%",
                record.strategy, record.metrics.mape, record.metrics.wape
            );
        }

        if !context.actuals.is_empty() {
            let _ = writeln!(
                out,
                "\nHoldout sales trend: {}.",
                trend_word(&context.actuals).to_lowercase()
            );
        }
        Ok(out)
    }
}

/// Runs an optional external generator with the template as fallback
#[derive(Default)]
pub struct InsightService {
    generator: Option<Box<dyn InsightGenerator + Send + Sync>>,
    fallback: TemplateInsight,
}

impl InsightService {
    /// Service that only uses the template
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generator(generator: Box<dyn InsightGenerator + Send + Sync>) -> Self {
        Self {
            generator: Some(generator),
            fallback: TemplateInsight,
        }
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// External text when available, otherwise the template
    pub fn interpret(&self, context: &InsightContext) -> Result<String> {
        if let Some(generator) = &self.generator {
            match generator.generate(context) {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => warn!("insight generator returned empty text, using template"),
                Err(err) => warn!(error = %err, "insight generator failed, using template"),
            }
        }
        self.fallback.generate(context)
    }
}

/// One-sentence summary of a projection
pub fn quick_insight(values: &[f64], strategy: StrategyKind) -> String {
    if values.is_empty() {
        return format!("The {} model produced no forecast.", strategy);
    }
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    format!(
        "The {} model predicts an average sales of ${} for the next {} months.",
        strategy,
        group_thousands(avg.round()),
        values.len()
    )
}

/// `1234567.0` as `1,234,567`
fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}
