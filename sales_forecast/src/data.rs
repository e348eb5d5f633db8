//! Monthly sales series loading and validation

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Name of the required date column
pub const MONTH_COLUMN: &str = "Month";
/// Name of the required sales column
pub const SALES_COLUMN: &str = "Sales";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Days between 0001-01-01 and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Ordered monthly sales observations
///
/// Months are normalised to the first day of the month, strictly increasing
/// and exactly one calendar month apart. Sales are finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    months: Vec<NaiveDate>,
    sales: Vec<f64>,
}

impl TimeSeries {
    /// Create a validated series; observations are sorted by month first
    pub fn new(months: Vec<NaiveDate>, sales: Vec<f64>) -> Result<Self> {
        if months.len() != sales.len() {
            return Err(ForecastError::DataFormatError(format!(
                "{} months but {} sales values",
                months.len(),
                sales.len()
            )));
        }

        let mut rows: Vec<(NaiveDate, f64)> = months
            .into_iter()
            .map(first_of_month)
            .zip(sales)
            .collect();
        rows.sort_by_key(|(month, _)| *month);

        let (months, sales): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
        validate(&months, &sales)?;

        Ok(Self { months, sales })
    }

    /// Create a series of consecutive months starting at `start`
    pub fn from_values(start: NaiveDate, sales: Vec<f64>) -> Result<Self> {
        let start = first_of_month(start);
        let months = (0..sales.len())
            .map(|i| {
                start.checked_add_months(Months::new(i as u32)).ok_or_else(|| {
                    ForecastError::DataFormatError("month out of calendar range".to_string())
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(months, sales)
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.sales.len()
    }

    /// Whether the series has no observations
    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }

    /// Observation months in ascending order
    pub fn months(&self) -> &[NaiveDate] {
        &self.months
    }

    /// Sales values aligned with `months()`
    pub fn sales(&self) -> &[f64] {
        &self.sales
    }

    /// Most recent month
    pub fn last_month(&self) -> Option<NaiveDate> {
        self.months.last().copied()
    }

    /// Most recent sales value
    pub fn last_sales(&self) -> Option<f64> {
        self.sales.last().copied()
    }

    /// Descriptive statistics of the series
    pub fn summary(&self) -> Result<SeriesSummary> {
        SeriesSummary::from_series(self)
    }

    /// Convert to a two column DataFrame (`Month` as `%Y-%m-%d` text, `Sales`)
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let months: Vec<String> = self
            .months
            .iter()
            .map(|m| m.format("%Y-%m-%d").to_string())
            .collect();

        let df = DataFrame::new(vec![
            Series::new(MONTH_COLUMN, months),
            Series::new(SALES_COLUMN, self.sales.clone()),
        ])?;
        Ok(df)
    }
}

/// Data loader for monthly sales series
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a series from a CSV file with `Month` and `Sales` columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load a series from any CSV source with `Month` and `Sales` columns
    pub fn from_reader<R: Read>(reader: R) -> Result<TimeSeries> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let month_idx = Self::column_index(&headers, MONTH_COLUMN)?;
        let sales_idx = Self::column_index(&headers, SALES_COLUMN)?;

        let mut months = Vec::new();
        let mut sales = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let raw_month = record.get(month_idx).unwrap_or_default();
            let raw_sales = record.get(sales_idx).unwrap_or_default();

            months.push(parse_month(raw_month).ok_or_else(|| {
                ForecastError::DataFormatError(format!(
                    "row {}: unparseable date '{}'",
                    row + 1,
                    raw_month
                ))
            })?);
            sales.push(raw_sales.parse::<f64>().map_err(|_| {
                ForecastError::DataFormatError(format!(
                    "row {}: non-numeric sales value '{}'",
                    row + 1,
                    raw_sales
                ))
            })?);
        }

        TimeSeries::new(months, sales)
    }

    /// Create a series from an existing DataFrame
    ///
    /// `Month` may be a date column or text; `Sales` may be any numeric type.
    pub fn from_dataframe(df: &DataFrame) -> Result<TimeSeries> {
        let month_col = df.column(MONTH_COLUMN).map_err(|_| missing_column(MONTH_COLUMN))?;
        let sales_col = df.column(SALES_COLUMN).map_err(|_| missing_column(SALES_COLUMN))?;

        let months = Self::months_from_series(month_col)?;

        let sales_f64 = sales_col.cast(&DataType::Float64).map_err(|_| {
            ForecastError::DataFormatError("Sales column is not numeric".to_string())
        })?;
        let sales = sales_f64
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| {
                    ForecastError::DataFormatError(format!(
                        "row {}: missing or non-numeric sales value",
                        row + 1
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        TimeSeries::new(months, sales)
    }

    fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| missing_column(name))
    }

    fn months_from_series(col: &Series) -> Result<Vec<NaiveDate>> {
        let unparseable = |row: usize| {
            ForecastError::DataFormatError(format!("row {}: unparseable date", row + 1))
        };

        match col.dtype() {
            DataType::Date => col
                .date()?
                .into_iter()
                .enumerate()
                .map(|(row, days)| {
                    days.and_then(|d| {
                        NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE)
                    })
                    .ok_or_else(|| unparseable(row))
                })
                .collect(),
            _ => {
                let text = col.cast(&DataType::Utf8)?;
                let text = text.utf8()?;
                text.into_iter()
                    .enumerate()
                    .map(|(row, s)| s.and_then(parse_month).ok_or_else(|| unparseable(row)))
                    .collect()
            }
        }
    }
}

/// Parse a date in one of the accepted layouts and normalise it to the first of the month
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d").ok())
        .map(first_of_month)
}

/// Number of months since year 0, used to check monthly spacing
pub fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn missing_column(name: &str) -> ForecastError {
    ForecastError::DataFormatError(format!("required column '{}' is missing", name))
}

fn validate(months: &[NaiveDate], sales: &[f64]) -> Result<()> {
    if sales.len() < 2 {
        return Err(ForecastError::DataFormatError(format!(
            "at least 2 monthly observations are required, got {}",
            sales.len()
        )));
    }

    if let Some((i, v)) = sales
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(ForecastError::DataFormatError(format!(
            "sales must be finite and non-negative, got {} for {}",
            v, months[i]
        )));
    }

    for pair in months.windows(2) {
        let gap = month_index(pair[1]) - month_index(pair[0]);
        if gap == 0 {
            return Err(ForecastError::DataFormatError(format!(
                "duplicate month {}",
                pair[1].format("%Y-%m")
            )));
        }
        if gap != 1 {
            return Err(ForecastError::DataFormatError(format!(
                "months must be consecutive, found a gap between {} and {}",
                pair[0].format("%Y-%m"),
                pair[1].format("%Y-%m")
            )));
        }
    }

    Ok(())
}

/// Descriptive statistics of a sales series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub total_months: usize,
    pub mean_sales: f64,
    pub median_sales: f64,
    pub min_sales: f64,
    pub max_sales: f64,
    pub std_sales: f64,
    /// Percent change from the first to the last month; undefined when the first month is zero
    pub growth_rate: Option<f64>,
    /// Months further than three standard deviations from the mean
    pub outliers: usize,
    pub start_month: NaiveDate,
    pub end_month: NaiveDate,
}

impl SeriesSummary {
    /// Summarise a validated series
    pub fn from_series(series: &TimeSeries) -> Result<Self> {
        let sales = series.sales();
        let mean_sales = sales_math::mean(sales)?;
        let std_sales = sales_math::sample_std_dev(sales)?;
        let (min_sales, max_sales) = sales_math::statistics::min_max(sales)?;

        let first = sales[0];
        let last = sales[sales.len() - 1];
        let growth_rate = (first != 0.0).then(|| (last - first) / first * 100.0);

        let outliers = sales
            .iter()
            .filter(|&&v| (v - mean_sales).abs() > 3.0 * std_sales)
            .count();

        Ok(Self {
            total_months: sales.len(),
            mean_sales,
            median_sales: sales_math::median(sales)?,
            min_sales,
            max_sales,
            std_sales,
            growth_rate,
            outliers,
            start_month: series.months()[0],
            end_month: series.months()[series.len() - 1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_layouts() {
        let jan = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(parse_month("2023-01-15"), Some(jan));
        assert_eq!(parse_month("2023-01"), Some(jan));
        assert_eq!(parse_month("2023/01/31"), Some(jan));
        assert_eq!(parse_month("01/20/2023"), Some(jan));
        assert_eq!(parse_month("2023-01-01 00:00:00"), Some(jan));
        assert_eq!(parse_month("January"), None);
    }

    #[test]
    fn test_new_sorts_and_normalises() {
        let months = vec![
            NaiveDate::from_ymd_opt(2023, 2, 10).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
        ];
        let series = TimeSeries::new(months, vec![20.0, 10.0]).unwrap();
        assert_eq!(series.sales(), &[10.0, 20.0]);
        assert_eq!(series.months()[0], NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    }

    #[test]
    fn test_gap_and_duplicate_rejected() {
        let d = |m| NaiveDate::from_ymd_opt(2023, m, 1).unwrap();
        assert!(TimeSeries::new(vec![d(1), d(3)], vec![1.0, 2.0]).is_err());
        assert!(TimeSeries::new(vec![d(1), d(1)], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_negative_sales_rejected() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let err = TimeSeries::from_values(start, vec![1.0, -2.0]).unwrap_err();
        assert!(matches!(err, ForecastError::DataFormatError(_)));
    }

    #[test]
    fn test_from_values_crosses_year_boundary() {
        let start = NaiveDate::from_ymd_opt(2022, 11, 1).unwrap();
        let series = TimeSeries::from_values(start, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            series.last_month(),
            Some(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
        );
    }

    #[test]
    fn test_summary() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let series = TimeSeries::from_values(start, vec![100.0, 150.0, 200.0]).unwrap();
        let summary = series.summary().unwrap();
        assert_eq!(summary.total_months, 3);
        assert_eq!(summary.mean_sales, 150.0);
        assert_eq!(summary.median_sales, 150.0);
        assert_eq!(summary.growth_rate, Some(100.0));
        assert_eq!(summary.outliers, 0);
    }
}
