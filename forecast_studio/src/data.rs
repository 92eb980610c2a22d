//! Time series data handling for forecasting

use crate::error::{ForecastError, Result};
use crate::utils::parse_timestamp;
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// Name of the timestamp column in uploaded files
pub const TIME_COLUMN: &str = "ds";
/// Name of the measurement column in uploaded files
pub const VALUE_COLUMN: &str = "y";

/// One row of an uploaded table.
///
/// Cells that could not be parsed are kept as `None` so the row can still
/// be displayed; such rows are skipped when fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesRow {
    pub timestamp: Option<NaiveDateTime>,
    pub value: Option<f64>,
}

/// A row usable for modeling: both cells present and the value finite
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Time series data structure for forecasting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesData {
    rows: Vec<TimeSeriesRow>,
}

/// Data loader for uploaded `ds`/`y` tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Parse an uploaded delimited table.
    ///
    /// The header must contain `ds` and `y`; further columns are ignored.
    /// Timestamps that cannot be parsed become `None` instead of failing
    /// the whole load.
    pub fn load(bytes: &[u8], delimiter: u8) -> Result<TimeSeriesData> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ForecastError::IngestionError(
                "The uploaded file is empty".to_string(),
            ));
        }

        let df = CsvReader::new(Cursor::new(bytes))
            .has_header(true)
            .with_delimiter(delimiter)
            .infer_schema(None)
            .finish()
            .map_err(|e| {
                ForecastError::IngestionError(format!(
                    "Could not read the file as a table separated by '{}': {}",
                    delimiter as char, e
                ))
            })?;

        Self::from_dataframe(&df, delimiter)
    }

    /// Read and parse a file from disk
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<TimeSeriesData> {
        let bytes = fs::read(path)?;
        Self::load(&bytes, delimiter)
    }

    /// Build the typed table from a parsed DataFrame
    fn from_dataframe(df: &DataFrame, delimiter: u8) -> Result<TimeSeriesData> {
        let time_column = Self::find_column(df, TIME_COLUMN, delimiter)?;
        let value_column = Self::find_column(df, VALUE_COLUMN, delimiter)?;

        let timestamps = Self::timestamp_cells(df, &time_column)?;
        let values = Self::value_cells(df, &value_column)?;

        let rows: Vec<TimeSeriesRow> = timestamps
            .into_iter()
            .zip(values)
            .map(|(timestamp, value)| TimeSeriesRow { timestamp, value })
            .collect();

        let data = TimeSeriesData::from_rows(rows);
        let missing = data.missing_timestamps();
        if missing > 0 {
            warn!(
                missing,
                rows = data.len(),
                "timestamps that could not be parsed were set to missing"
            );
        }
        debug!(rows = data.len(), "loaded time series table");

        Ok(data)
    }

    /// Find a column by name, ignoring surrounding whitespace
    fn find_column(df: &DataFrame, wanted: &str, delimiter: u8) -> Result<String> {
        let names = df.get_column_names();
        names
            .iter()
            .find(|name| name.trim() == wanted)
            .map(|name| name.to_string())
            .ok_or_else(|| {
                ForecastError::IngestionError(format!(
                    "Expected columns '{}' and '{}' separated by '{}', found columns {:?}",
                    TIME_COLUMN, VALUE_COLUMN, delimiter as char, names
                ))
            })
    }

    fn timestamp_cells(df: &DataFrame, column: &str) -> Result<Vec<Option<NaiveDateTime>>> {
        let series = df.column(column)?.cast(&DataType::Utf8)?;
        let cells = series.utf8()?;
        Ok(cells
            .into_iter()
            .map(|cell| cell.and_then(parse_timestamp))
            .collect())
    }

    fn value_cells(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
        let series = df.column(column)?.cast(&DataType::Float64)?;
        let cells = series.f64()?;
        Ok(cells
            .into_iter()
            .map(|cell| cell.filter(|v| v.is_finite()))
            .collect())
    }
}

impl TimeSeriesData {
    /// Wrap already parsed rows
    pub fn from_rows(rows: Vec<TimeSeriesRow>) -> Self {
        Self { rows }
    }

    /// Create a new TimeSeriesData from dates and values (for testing)
    pub fn new(dates: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::IngestionError(format!(
                "Got {} timestamps but {} values",
                dates.len(),
                values.len()
            )));
        }

        Ok(Self::from_rows(
            dates
                .into_iter()
                .zip(values)
                .map(|(timestamp, value)| TimeSeriesRow {
                    timestamp: Some(timestamp),
                    value: Some(value),
                })
                .collect(),
        ))
    }

    /// All rows in upload order, including unusable ones
    pub fn rows(&self) -> &[TimeSeriesRow] {
        &self.rows
    }

    /// Rows usable for modeling, in upload order
    pub fn observations(&self) -> Vec<Observation> {
        self.rows
            .iter()
            .filter_map(|row| match (row.timestamp, row.value) {
                (Some(timestamp), Some(value)) if value.is_finite() => {
                    Some(Observation { timestamp, value })
                }
                _ => None,
            })
            .collect()
    }

    /// Latest valid timestamp, ignoring missing ones
    pub fn max_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.iter().filter_map(|row| row.timestamp).max()
    }

    /// Earliest valid timestamp, ignoring missing ones
    pub fn min_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.iter().filter_map(|row| row.timestamp).min()
    }

    /// Number of rows whose timestamp could not be parsed
    pub fn missing_timestamps(&self) -> usize {
        self.rows.iter().filter(|row| row.timestamp.is_none()).count()
    }

    /// Present values of the measurement column
    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|row| row.value).collect()
    }

    /// Check if the time series is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the length of the time series
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Descriptive statistics for the preview panel
    pub fn describe(&self) -> DataSummary {
        DataSummary::describe(self)
    }
}

/// Descriptive statistics of an uploaded table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    /// Rows in the upload
    pub rows: usize,
    /// Rows with a parseable timestamp
    pub valid_timestamps: usize,
    /// Rows whose timestamp was set to missing
    pub missing_timestamps: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
    /// Rows with a numeric value
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl DataSummary {
    /// Summarize a table the way a data-frame `describe` would
    pub fn describe(data: &TimeSeriesData) -> Self {
        let values = data.values();
        let finite = |v: f64| if v.is_finite() { Some(v) } else { None };
        let quantile = |q: f64| series_math::stats::percentile(&values, q).ok();

        Self {
            rows: data.len(),
            valid_timestamps: data.len() - data.missing_timestamps(),
            missing_timestamps: data.missing_timestamps(),
            first_timestamp: data.min_timestamp(),
            last_timestamp: data.max_timestamp(),
            count: values.len(),
            mean: finite(values.iter().mean()),
            std: finite(values.iter().std_dev()),
            min: quantile(0.0),
            q25: quantile(25.0),
            median: quantile(50.0),
            q75: quantile(75.0),
            max: quantile(100.0),
        }
    }
}

impl std::fmt::Display for DataSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: Option<f64>| v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string());
        let show_ts = |v: Option<NaiveDateTime>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());

        writeln!(f, "Data Summary:")?;
        writeln!(f, "  rows:     {}", self.rows)?;
        writeln!(f, "  ds valid: {} (missing {})", self.valid_timestamps, self.missing_timestamps)?;
        writeln!(f, "  ds range: {} .. {}", show_ts(self.first_timestamp), show_ts(self.last_timestamp))?;
        writeln!(f, "  y count:  {}", self.count)?;
        writeln!(f, "  mean:     {}", show(self.mean))?;
        writeln!(f, "  std:      {}", show(self.std))?;
        writeln!(f, "  min:      {}", show(self.min))?;
        writeln!(f, "  25%:      {}", show(self.q25))?;
        writeln!(f, "  50%:      {}", show(self.median))?;
        writeln!(f, "  75%:      {}", show(self.q75))?;
        writeln!(f, "  max:      {}", show(self.max))?;
        Ok(())
    }
}
