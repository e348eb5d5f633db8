use chrono::NaiveDate;
use polars::prelude::*;
use sales_forecast::data::{DataLoader, TimeSeries};
use sales_forecast::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_data_loader_from_csv() {
    let file = csv_file(&[
        "Month,Sales,Region",
        "2023-01-01,100.0,North",
        "2023-02-01,110.5,North",
        "2023-03-01,105.0,North",
    ]);

    let series = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(series.len(), 3);
    assert_eq!(series.sales(), &[100.0, 110.5, 105.0]);
    assert_eq!(
        series.last_month(),
        Some(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap())
    );
}

#[test]
fn test_unsorted_rows_are_sorted() {
    let file = csv_file(&["Month,Sales", "2023-03,30", "2023-01,10", "2023-02,20"]);
    let series = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(series.sales(), &[10.0, 20.0, 30.0]);
}

#[test]
fn test_missing_column_is_data_format_error() {
    let file = csv_file(&["Date,Sales", "2023-01-01,100.0", "2023-02-01,110.0"]);
    let err = DataLoader::from_csv(file.path()).unwrap_err();
    assert!(matches!(err, ForecastError::DataFormatError(ref m) if m.contains("Month")));
}

#[test]
fn test_unparseable_date_is_data_format_error() {
    let file = csv_file(&["Month,Sales", "2023-01-01,100.0", "someday,110.0"]);
    let err = DataLoader::from_csv(file.path()).unwrap_err();
    assert!(matches!(err, ForecastError::DataFormatError(_)));
}

#[test]
fn test_non_numeric_sales_is_data_format_error() {
    let file = csv_file(&["Month,Sales", "2023-01-01,100.0", "2023-02-01,lots"]);
    let err = DataLoader::from_csv(file.path()).unwrap_err();
    assert!(matches!(err, ForecastError::DataFormatError(ref m) if m.contains("lots")));
}

#[test]
fn test_missing_month_is_rejected() {
    let file = csv_file(&["Month,Sales", "2023-01-01,100.0", "2023-03-01,110.0"]);
    assert!(DataLoader::from_csv(file.path()).is_err());
}

#[test]
fn test_nonexistent_file_is_io_error() {
    let err = DataLoader::from_csv("nonexistent_file.csv").unwrap_err();
    assert!(matches!(err, ForecastError::IoError(_)));
}

#[test]
fn test_from_dataframe_roundtrip() {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let series = TimeSeries::from_values(start, vec![5.0, 6.0, 7.0, 8.0]).unwrap();
    let df = series.to_dataframe().unwrap();
    assert_eq!(df.shape(), (4, 2));

    let back = DataLoader::from_dataframe(&df).unwrap();
    assert_eq!(back, series);
}

#[test]
fn test_from_dataframe_integer_sales() {
    let df = df! {
        "Month" => &["2023-01", "2023-02", "2023-03"],
        "Sales" => &[1i64, 2, 3],
    }
    .unwrap();
    let series = DataLoader::from_dataframe(&df).unwrap();
    assert_eq!(series.sales(), &[1.0, 2.0, 3.0]);
}

#[test]
fn test_single_row_is_rejected() {
    let file = csv_file(&["Month,Sales", "2023-01-01,100.0"]);
    assert!(DataLoader::from_csv(file.path()).is_err());
}
