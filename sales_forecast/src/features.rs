//! Feature engineering for monthly sales
//!
//! Turns a [`TimeSeries`] into a [`FeatureTable`] with one row per month:
//!
//! 1. lag features `Sales_Lag_{L}`
//! 2. calendar features `Month_Num`, `Quarter`, `Month_Sin`, `Month_Cos`
//! 3. one-hot season indicators `Season_{Fall,Spring,Summer,Winter}`
//! 4. rolling statistics `Sales_RollingMean_{W}`, `Sales_RollingStd_{W}`
//! 5. backward fill of the cells left empty by steps 1 and 4
//!
//! The backward fill copies later observations into earlier rows. Rows at the
//! start of the series therefore carry information from the future, which is
//! a look-ahead leak when those rows are used for training.

use crate::config::FeatureConfig;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use sales_math::{rolling_mean, rolling_std};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Meteorological season of a calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Indicator column order
    pub const ALL: [Season; 4] = [Season::Fall, Season::Spring, Season::Summer, Season::Winter];

    /// Season of a month number (1-12)
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Fall,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }
}

/// One month of engineered features
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub month: NaiveDate,
    pub sales: f64,
    pub season: Season,
    values: Vec<Option<f64>>,
}

impl FeatureRow {
    /// Feature cells in the order of [`FeatureTable::feature_columns`]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }
}

/// Chronologically ordered feature rows aligned 1:1 with the source series
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Names of the model input columns (excludes month, sales and season label)
    pub fn feature_columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&FeatureRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sales values in row order
    pub fn sales(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.sales).collect()
    }

    /// Months in row order
    pub fn months(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.month).collect()
    }

    /// Position of a feature column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// A single feature column
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// A single cell
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        let idx = self.column_index(name)?;
        self.rows.get(row).and_then(|r| r.values[idx])
    }

    /// Whether any feature cell is still missing after backward fill
    pub fn has_missing(&self) -> bool {
        self.rows.iter().any(|r| r.values.iter().any(Option::is_none))
    }

    /// Rows `start..end` as a new table
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.rows.len());
        let start = start.min(end);
        Self {
            columns: self.columns.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// Append the rows of `other`, which must share the same columns
    pub fn concat(&self, other: &FeatureTable) -> Result<Self> {
        if self.columns != other.columns {
            return Err(ForecastError::ConfigurationError(
                "cannot concatenate feature tables with different columns".to_string(),
            ));
        }
        let mut rows = self.rows.clone();
        rows.extend(other.rows.iter().cloned());
        Ok(Self {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Dense model input for the given columns; missing cells become 0.0
    pub fn matrix(&self, columns: &[String]) -> Result<Vec<Vec<f64>>> {
        let indices = self.indices_of(columns)?;
        Ok(self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r.values[i].unwrap_or(0.0)).collect())
            .collect())
    }

    /// Model input of the most recent row; missing cells become 0.0
    pub fn last_feature_vector(&self, columns: &[String]) -> Result<Vec<f64>> {
        let indices = self.indices_of(columns)?;
        let last = self.rows.last().ok_or_else(|| {
            ForecastError::DataFormatError("feature table is empty".to_string())
        })?;
        Ok(indices.iter().map(|&i| last.values[i].unwrap_or(0.0)).collect())
    }

    fn indices_of(&self, columns: &[String]) -> Result<Vec<usize>> {
        columns
            .iter()
            .map(|c| {
                self.column_index(c).ok_or_else(|| {
                    ForecastError::ConfigurationError(format!("unknown feature column '{}'", c))
                })
            })
            .collect()
    }

    /// Full table as a DataFrame, including `Month`, `Sales` and `Season`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let months: Vec<String> = self
            .rows
            .iter()
            .map(|r| r.month.format("%Y-%m-%d").to_string())
            .collect();
        let seasons: Vec<&str> = self.rows.iter().map(|r| r.season.name()).collect();

        let mut columns = vec![
            Series::new("Month", months),
            Series::new("Sales", self.sales()),
            Series::new("Season", seasons),
        ];
        for (idx, name) in self.columns.iter().enumerate() {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.values[idx]).collect();
            columns.push(Series::new(name, values));
        }

        Ok(DataFrame::new(columns)?)
    }
}

/// Builds feature tables according to a [`FeatureConfig`]
#[derive(Debug, Clone, Default)]
pub struct FeaturePipeline {
    config: FeatureConfig,
}

impl FeaturePipeline {
    pub fn new(config: FeatureConfig) -> Result<Self> {
        if config.lags.iter().any(|&l| l == 0) || config.rolling_windows.iter().any(|&w| w == 0)
        {
            return Err(ForecastError::ConfigurationError(
                "lags and rolling windows must be positive".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Largest lag offset; shorter series keep missing lag cells
    pub fn max_lag(&self) -> usize {
        self.config.lags.iter().copied().max().unwrap_or(0)
    }

    /// Build the feature table; a pure function of the series
    pub fn build(&self, series: &TimeSeries) -> Result<FeatureTable> {
        let sales = series.sales();
        let months = series.months();
        let n = sales.len();

        let mut columns: Vec<(String, Vec<Option<f64>>)> = Vec::new();

        for &lag in &self.config.lags {
            let values = (0..n)
                .map(|i| i.checked_sub(lag).map(|j| sales[j]))
                .collect();
            columns.push((format!("Sales_Lag_{}", lag), values));
        }

        let month_nums: Vec<u32> = months.iter().map(|m| m.month()).collect();
        columns.push((
            "Month_Num".to_string(),
            month_nums.iter().map(|&m| Some(m as f64)).collect(),
        ));
        columns.push((
            "Quarter".to_string(),
            month_nums.iter().map(|&m| Some(((m - 1) / 3 + 1) as f64)).collect(),
        ));
        columns.push((
            "Month_Sin".to_string(),
            month_nums.iter().map(|&m| Some(month_angle(m).sin())).collect(),
        ));
        columns.push((
            "Month_Cos".to_string(),
            month_nums.iter().map(|&m| Some(month_angle(m).cos())).collect(),
        ));

        let seasons: Vec<Season> = month_nums.iter().map(|&m| Season::from_month(m)).collect();
        for season in Season::ALL {
            let indicator = seasons
                .iter()
                .map(|&s| Some(if s == season { 1.0 } else { 0.0 }))
                .collect();
            columns.push((format!("Season_{}", season.name()), indicator));
        }

        let alignment = self.config.rolling_alignment;
        for &window in &self.config.rolling_windows {
            columns.push((
                format!("Sales_RollingMean_{}", window),
                rolling_mean(sales, window, alignment)?,
            ));
            columns.push((
                format!("Sales_RollingStd_{}", window),
                rolling_std(sales, window, alignment)?,
            ));
        }

        for (_, values) in columns.iter_mut() {
            backward_fill(values);
        }

        let names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();
        let rows = (0..n)
            .map(|i| FeatureRow {
                month: months[i],
                sales: sales[i],
                season: seasons[i],
                values: columns.iter().map(|(_, values)| values[i]).collect(),
            })
            .collect();

        let table = FeatureTable {
            columns: names,
            rows,
        };
        debug!(
            rows = table.len(),
            columns = table.feature_columns().len(),
            missing = table.has_missing(),
            "built feature table"
        );

        Ok(table)
    }
}

/// Build features with the default lags, windows and alignment
pub fn build_features(series: &TimeSeries) -> Result<FeatureTable> {
    FeaturePipeline::default().build(series)
}

fn month_angle(month: u32) -> f64 {
    2.0 * PI * month as f64 / 12.0
}

/// Fill each gap with the next later value; trailing gaps stay empty
fn backward_fill(values: &mut [Option<f64>]) {
    let mut next = None;
    for cell in values.iter_mut().rev() {
        match cell {
            Some(v) => next = Some(*v),
            None => *cell = next,
        }
    }
}
