use approx::assert_relative_eq;
use rstest::rstest;
use sales_forecast::metrics::{
    mean_absolute_error, mean_absolute_percentage_error, root_mean_squared_error,
    weighted_absolute_percentage_error, Metric, Metrics,
};
use sales_forecast::ForecastError;

#[test]
fn test_metrics_against_hand_computed_values() {
    let actual = [180.0, 160.0, 140.0];
    let predicted = [180.0, 180.0, 180.0];

    let m = Metrics::compute(&actual, &predicted).unwrap();
    assert_relative_eq!(m.mape, (0.0 + 20.0 / 160.0 + 40.0 / 140.0) / 3.0 * 100.0, epsilon = 1e-9);
    assert_relative_eq!(m.mape, 13.690476190476, epsilon = 1e-9);
    assert_relative_eq!(m.wape, 12.5, epsilon = 1e-12);
    assert_relative_eq!(m.mae, 20.0, epsilon = 1e-12);
    assert_relative_eq!(m.rmse, (2000.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
}

#[rstest]
#[case(vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0])]
#[case(vec![5.5, 0.5], vec![5.5, 0.5])]
fn test_perfect_predictions_score_zero(#[case] actual: Vec<f64>, #[case] predicted: Vec<f64>) {
    let m = Metrics::compute(&actual, &predicted).unwrap();
    assert_eq!(m.mae, 0.0);
    assert_eq!(m.rmse, 0.0);
    assert_eq!(m.mape, 0.0);
    assert_eq!(m.wape, 0.0);
}

#[rstest]
#[case(vec![10.0, 20.0], vec![11.0, 20.0])]
#[case(vec![3.0, 4.0, 5.0], vec![1.0, 9.0, 5.0])]
fn test_metrics_are_non_negative(#[case] actual: Vec<f64>, #[case] predicted: Vec<f64>) {
    let m = Metrics::compute(&actual, &predicted).unwrap();
    for metric in Metric::ALL {
        assert!(m.get(metric) >= 0.0);
    }
    assert!(m.mae > 0.0 && m.rmse > 0.0);
}

#[test]
fn test_zero_actual_never_yields_infinity() {
    let err = mean_absolute_percentage_error(&[100.0, 0.0], &[90.0, 5.0]).unwrap_err();
    assert!(matches!(err, ForecastError::MetricError(_)));
    assert!(Metrics::compute(&[100.0, 0.0], &[90.0, 5.0]).is_err());

    // remaining metrics stay defined
    assert_relative_eq!(
        weighted_absolute_percentage_error(&[100.0, 0.0], &[90.0, 5.0]).unwrap(),
        15.0
    );
    assert_relative_eq!(mean_absolute_error(&[100.0, 0.0], &[90.0, 5.0]).unwrap(), 7.5);
}

#[test]
fn test_rmse_penalises_large_errors() {
    let actual = [10.0, 10.0, 10.0, 10.0];
    let spread = [11.0, 9.0, 11.0, 9.0];
    let spike = [10.0, 10.0, 10.0, 14.0];
    assert_relative_eq!(mean_absolute_error(&actual, &spread).unwrap(), 1.0);
    assert_relative_eq!(mean_absolute_error(&actual, &spike).unwrap(), 1.0);
    assert!(
        root_mean_squared_error(&actual, &spike).unwrap()
            > root_mean_squared_error(&actual, &spread).unwrap()
    );
}

#[test]
fn test_metrics_display() {
    let m = Metrics::compute(&[100.0], &[90.0]).unwrap();
    let text = m.to_string();
    assert!(text.contains("MAPE:  10.0000%"));
    assert!(text.contains("RMSE:  10.0000"));
}
