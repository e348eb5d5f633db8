//! CSV export of metrics and projections

use crate::error::{ForecastError, Result};
use crate::evaluation::MetricsTable;
use crate::projection::FutureForecast;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct MetricsRow<'a> {
    #[serde(rename = "Model")]
    model: &'a str,
    #[serde(rename = "MAPE")]
    mape: f64,
    #[serde(rename = "WAPE")]
    wape: f64,
    #[serde(rename = "MAE")]
    mae: f64,
    #[serde(rename = "RMSE")]
    rmse: f64,
}

#[derive(Serialize)]
struct ForecastRow {
    #[serde(rename = "Month")]
    month: String,
    #[serde(rename = "Predicted_Sales")]
    predicted_sales: f64,
}

/// Write `Model,MAPE,WAPE,MAE,RMSE` rows in evaluation order
pub fn write_metrics<W: Write>(writer: W, table: &MetricsTable) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if table.is_empty() {
        csv.write_record(["Model", "MAPE", "WAPE", "MAE", "RMSE"])?;
    }
    for record in table.records() {
        csv.serialize(MetricsRow {
            model: record.strategy.name(),
            mape: record.metrics.mape,
            wape: record.metrics.wape,
            mae: record.metrics.mae,
            rmse: record.metrics.rmse,
        })?;
    }
    csv.flush()?;
    Ok(())
}

/// Write `Month,Predicted_Sales` rows, months as `%Y-%m-%d`
pub fn write_forecast<W: Write>(writer: W, forecast: &FutureForecast) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if forecast.is_empty() {
        csv.write_record(["Month", "Predicted_Sales"])?;
    }
    for point in &forecast.points {
        csv.serialize(ForecastRow {
            month: point.month.format("%Y-%m-%d").to_string(),
            predicted_sales: point.predicted_sales,
        })?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_metrics_csv<P: AsRef<Path>>(path: P, table: &MetricsTable) -> Result<()> {
    write_metrics(std::fs::File::create(path)?, table)
}

pub fn write_forecast_csv<P: AsRef<Path>>(path: P, forecast: &FutureForecast) -> Result<()> {
    write_forecast(std::fs::File::create(path)?, forecast)
}

pub fn metrics_to_csv(table: &MetricsTable) -> Result<String> {
    let mut buf = Vec::new();
    write_metrics(&mut buf, table)?;
    into_string(buf)
}

pub fn forecast_to_csv(forecast: &FutureForecast) -> Result<String> {
    let mut buf = Vec::new();
    write_forecast(&mut buf, forecast)?;
    into_string(buf)
}

fn into_string(buf: Vec<u8>) -> Result<String> {
    String::from_utf8(buf).map_err(|e| ForecastError::CsvError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::models::StrategyKind;
    use crate::projection::FuturePoint;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_metrics_columns() {
        let mut table = MetricsTable::new();
        table.insert(
            StrategyKind::RandomForest,
            Metrics {
                mape: 1.5,
                wape: 2.0,
                mae: 3.0,
                rmse: 4.25,
            },
        );
        assert_eq!(
            metrics_to_csv(&table).unwrap(),
            "Model,MAPE,WAPE,MAE,RMSE\nRandom_Forest,1.5,2.0,3.0,4.25\n"
        );
    }

    #[test]
    fn test_empty_exports_keep_header() {
        assert_eq!(
            metrics_to_csv(&MetricsTable::new()).unwrap(),
            "Model,MAPE,WAPE,MAE,RMSE\n"
        );
        let empty = FutureForecast {
            strategy: StrategyKind::Naive,
            band: 0.0,
            points: Vec::new(),
        };
        assert_eq!(forecast_to_csv(&empty).unwrap(), "Month,Predicted_Sales\n");
    }

    #[test]
    fn test_forecast_columns() {
        let forecast = FutureForecast {
            strategy: StrategyKind::Naive,
            band: 10.0,
            points: vec![FuturePoint {
                month: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                predicted_sales: 120.0,
                lower: 110.0,
                upper: 130.0,
            }],
        };
        assert_eq!(
            forecast_to_csv(&forecast).unwrap(),
            "Month,Predicted_Sales\n2024-01-01,120.0\n"
        );
    }
}
