use sales_forecast::insight::quick_insight;
use sales_forecast::{ForecastConfig, ForecastSession, Metric};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("Sales Forecast: Basic Forecasting Example");
    println!("=========================================\n");

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/examples/csv/monthly_sales.csv");
    let mut session = ForecastSession::from_csv(path, ForecastConfig::default())?;

    let summary = session.summary()?;
    println!(
        "Loaded {} months ({} to {}), mean sales {:.2}\n",
        summary.total_months, summary.start_month, summary.end_month, summary.mean_sales
    );

    session.run_all()?;
    let best = session.best_model(Metric::Mape)?;
    println!("Best model by MAPE: {}", best);
    if let Some(metrics) = session.metrics().get(best) {
        println!("{}", metrics);
    }

    let forecast = session.forecast_future(best, 3)?;
    println!("Forecast for the next {} months:", forecast.len());
    for point in &forecast.points {
        println!(
            "  {}: {:>10.2}  [{:.2}, {:.2}]",
            point.month.format("%Y-%m"),
            point.predicted_sales,
            point.lower,
            point.upper
        );
    }

    println!("\n{}", quick_insight(&forecast.values(), best));
    Ok(())
}
