use chrono::NaiveDate;
use sales_forecast::export::{
    forecast_to_csv, metrics_to_csv, write_forecast_csv, write_metrics_csv,
};
use sales_forecast::{ForecastConfig, ForecastSession, StrategyKind, TimeSeries};
use std::fs;
use tempfile::tempdir;

fn session() -> ForecastSession {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let values = vec![
        100.0, 110.0, 105.0, 130.0, 150.0, 170.0, 190.0, 200.0, 180.0, 160.0, 140.0, 120.0,
    ];
    let series = TimeSeries::from_values(start, values).unwrap();
    let mut session = ForecastSession::start(series, ForecastConfig::default()).unwrap();
    session.run_all().unwrap();
    session
}

#[test]
fn test_metrics_csv_layout() {
    let session = session();
    let text = metrics_to_csv(session.metrics()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Model,MAPE,WAPE,MAE,RMSE"));
    let models: Vec<&str> = lines.map(|l| l.split(',').next().unwrap()).collect();
    assert_eq!(models, vec!["Naive", "ARIMA", "Random_Forest", "Gradient_Boosting"]);
}

#[test]
fn test_forecast_csv_layout() {
    let session = session();
    let forecast = session.forecast_future(StrategyKind::Naive, 3).unwrap();
    assert_eq!(
        forecast_to_csv(&forecast).unwrap(),
        "Month,Predicted_Sales\n2024-01-01,120.0\n2024-02-01,120.0\n2024-03-01,120.0\n"
    );
}

#[test]
fn test_write_files() {
    let session = session();
    let dir = tempdir().unwrap();
    let metrics_path = dir.path().join("metrics.csv");
    let forecast_path = dir.path().join("forecast.csv");

    write_metrics_csv(&metrics_path, session.metrics()).unwrap();
    let forecast = session.forecast_future(StrategyKind::Naive, 2).unwrap();
    write_forecast_csv(&forecast_path, &forecast).unwrap();

    let metrics_text = fs::read_to_string(metrics_path).unwrap();
    assert_eq!(metrics_text.lines().count(), 5);
    let forecast_text = fs::read_to_string(forecast_path).unwrap();
    assert!(forecast_text.starts_with("Month,Predicted_Sales\n2024-01-01,120.0"));
}
