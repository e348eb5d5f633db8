use sales_forecast::export::{forecast_to_csv, metrics_to_csv};
use sales_forecast::insight::{InsightContext, InsightService};
use sales_forecast::{ForecastConfig, ForecastSession, Metric, StrategyKind};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    println!("Sales Forecast: Model Comparison Example");
    println!("========================================\n");

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/examples/csv/monthly_sales.csv");
    let config = ForecastConfig::default().with_strategies(StrategyKind::ALL.to_vec());
    let mut session = ForecastSession::from_csv(path, config)?;
    session.run_all()?;

    println!("{:<20} {:>10} {:>10} {:>10} {:>10}", "Model", "MAPE", "WAPE", "MAE", "RMSE");
    for record in session.metrics().ranked(Metric::Mape) {
        let m = record.metrics;
        println!(
            "{:<20} {:>9.2}% {:>9.2}% {:>10.2} {:>10.2}",
            record.strategy.name(),
            m.mape,
            m.wape,
            m.mae,
            m.rmse
        );
    }

    for failure in session.failures() {
        println!("\n{} fell back during {}: {}", failure.strategy, failure.stage, failure.reason);
    }

    let threshold = session.config().mape_threshold;
    let comparison = session.metrics().compare_against_threshold(threshold);
    println!(
        "\nWithin {:.1}% MAPE: {:?}",
        threshold, comparison.passing
    );

    let report = session.report(6)?;
    if let Some(importances) = &report.feature_importances {
        println!("\nTop features of {}:", report.best_model);
        let mut sorted = importances.clone();
        sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (name, value) in sorted.iter().take(5) {
            println!("  {:<24} {:.3}", name, value);
        }
    }

    println!("\nmetrics.csv\n{}", metrics_to_csv(&report.metrics)?);
    println!("forecast.csv\n{}", forecast_to_csv(&report.forecast)?);

    let context = InsightContext::from_session(&session)?;
    println!("{}", InsightService::new().interpret(&context)?);
    Ok(())
}
