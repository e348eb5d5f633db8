use approx::assert_relative_eq;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sales_forecast::{
    ForecastConfig, ForecastError, ForecastSession, Metric, StrategyKind, TimeSeries,
};

const EXAMPLE: [f64; 12] = [
    100.0, 110.0, 105.0, 130.0, 150.0, 170.0, 190.0, 200.0, 180.0, 160.0, 140.0, 120.0,
];

fn month(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).unwrap()
}

fn example_session(config: ForecastConfig) -> ForecastSession {
    let series = TimeSeries::from_values(month(2023, 1), EXAMPLE.to_vec()).unwrap();
    ForecastSession::start(series, config).unwrap()
}

#[test]
fn test_example_split_and_naive() {
    let mut session = example_session(ForecastConfig::default());
    let split = session.split(3).unwrap();
    assert_eq!(split.actuals(), vec![160.0, 140.0, 120.0]);
    assert_eq!(split.train.len(), 9);

    let run = session.run_strategy(StrategyKind::Naive).unwrap();
    assert_eq!(run.predictions, vec![180.0, 180.0, 180.0]);
}

#[test]
fn test_example_naive_mape() {
    let mut session = example_session(ForecastConfig::default());
    session.split(3).unwrap();
    session.run_strategy(StrategyKind::Naive).unwrap();
    let metrics = session.evaluate(StrategyKind::Naive).unwrap();

    // naive repeats 180 against actuals 160, 140, 120
    let expected = (20.0 / 160.0 + 40.0 / 140.0 + 60.0 / 120.0) / 3.0 * 100.0;
    assert_relative_eq!(metrics.mape, expected, epsilon = 1e-9);
    assert_relative_eq!(metrics.mape, 30.357142857142858, epsilon = 1e-9);
    assert_relative_eq!(metrics.wape, 120.0 / 420.0 * 100.0, epsilon = 1e-9);
    assert_relative_eq!(metrics.mae, 40.0, epsilon = 1e-12);
}

#[test]
fn test_example_future_naive() {
    let mut session = example_session(ForecastConfig::default());
    session.run_all().unwrap();

    let forecast = session.forecast_future(StrategyKind::Naive, 3).unwrap();
    assert_eq!(forecast.values(), vec![120.0, 120.0, 120.0]);
    assert_eq!(
        forecast.months(),
        vec![month(2024, 1), month(2024, 2), month(2024, 3)]
    );

    let band = 1.96 * 34.18698582794336;
    assert_relative_eq!(forecast.band, band, epsilon = 1e-9);
    assert_relative_eq!(forecast.points[0].lower, 120.0 - band, epsilon = 1e-9);
    assert_relative_eq!(forecast.points[0].upper, 120.0 + band, epsilon = 1e-9);
}

#[test]
fn test_run_all_evaluates_configured_strategies() {
    let mut session = example_session(ForecastConfig::default());
    let metrics = session.run_all().unwrap();
    let evaluated: Vec<StrategyKind> = metrics.records().iter().map(|r| r.strategy).collect();
    assert_eq!(
        evaluated,
        vec![
            StrategyKind::Naive,
            StrategyKind::Arima,
            StrategyKind::RandomForest,
            StrategyKind::GradientBoosting,
        ]
    );
}

#[test]
fn test_best_model_is_minimum() {
    let mut session = example_session(ForecastConfig::default());
    session.run_all().unwrap();

    for metric in Metric::ALL {
        let best = session.best_model(metric).unwrap();
        let best_value = session.metrics().get(best).unwrap().get(metric);
        for record in session.metrics().records() {
            assert!(best_value <= record.metrics.get(metric));
        }
    }
}

#[test]
fn test_forecast_horizon_is_validated() {
    let mut session = example_session(ForecastConfig::default());
    session.run_all().unwrap();
    for months in [0, 7] {
        let err = session.forecast_future(StrategyKind::Naive, months).unwrap_err();
        assert!(matches!(err, ForecastError::ConfigurationError(_)));
    }
}

#[test]
fn test_invalid_split_size() {
    let mut session = example_session(ForecastConfig::default());
    assert!(matches!(
        session.split(12).unwrap_err(),
        ForecastError::ConfigurationError(_)
    ));
    assert!(session.split(0).is_err());
}

#[test]
fn test_zero_actuals_cause_selection_failure() {
    let series = TimeSeries::from_values(
        month(2023, 1),
        vec![5.0, 7.0, 6.0, 8.0, 9.0, 0.0, 0.0, 0.0],
    )
    .unwrap();
    let mut session = ForecastSession::start(series, ForecastConfig::default()).unwrap();
    let err = session.run_all().unwrap_err();
    assert!(matches!(err, ForecastError::SelectionFailure(_)));
    let excluded = session
        .failures()
        .iter()
        .filter(|f| f.stage == "evaluation")
        .count();
    assert_eq!(excluded, 4);
    assert!(session.metrics().is_empty());
}

#[test]
fn test_sessions_are_independent() {
    let mut a = example_session(ForecastConfig::default());
    let mut b = example_session(ForecastConfig::default().with_test_horizon(2));
    a.run_all().unwrap();
    b.run_all().unwrap();
    assert_eq!(a.current_split().unwrap().test_len(), 3);
    assert_eq!(b.current_split().unwrap().test_len(), 2);
}

#[test]
fn test_report_serialises() {
    let mut session = example_session(
        ForecastConfig::default().with_strategies(vec![
            StrategyKind::Naive,
            StrategyKind::SeasonalNaive,
        ]),
    );
    let report = session.report(3).unwrap();
    assert_eq!(report.forecast.len(), 3);
    assert_eq!(report.summary.total_months, 12);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["metrics"][0]["Model"], "Naive");
    assert_eq!(json["metrics"][1]["Model"], "Seasonal_Naive");
    assert!(json["forecast"]["points"][0]["Predicted_Sales"].is_number());
}

#[test]
fn test_invalid_config_rejected_at_start() {
    let series = TimeSeries::from_values(month(2023, 1), EXAMPLE.to_vec()).unwrap();
    let config = ForecastConfig::default().with_test_horizon(9);
    assert!(ForecastSession::start(series, config).is_err());
}
