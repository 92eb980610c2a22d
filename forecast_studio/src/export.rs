//! Filter forecasts to the future and serialize them for download

use crate::error::{ForecastError, Result};
use crate::models::ForecastRow;
use crate::utils::{all_midnight, format_timestamp, parse_timestamp};
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::debug;

/// Name offered for the downloaded file
pub const EXPORT_FILE_NAME: &str = "forecast_data.csv";
/// Media type of the downloaded file
pub const EXPORT_MIME: &str = "text/csv";
/// Header of exported files
pub const EXPORT_HEADER: [&str; 4] = ["ds", "yhat", "yhat_lower", "yhat_upper"];

/// Forecast rows strictly after the last observed timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredForecast {
    rows: Vec<ForecastRow>,
}

impl FilteredForecast {
    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Keep only rows with `timestamp > max_observed`, preserving order
pub fn filter_future(rows: &[ForecastRow], max_observed: NaiveDateTime) -> FilteredForecast {
    FilteredForecast {
        rows: rows
            .iter()
            .filter(|row| row.timestamp > max_observed)
            .copied()
            .collect(),
    }
}

/// Write a filtered forecast as CSV with the `ds,yhat,yhat_lower,yhat_upper`
/// header
pub fn serialize(filtered: &FilteredForecast) -> Result<Vec<u8>> {
    let timestamps: Vec<NaiveDateTime> = filtered.rows.iter().map(|row| row.timestamp).collect();
    let date_only = all_midnight(&timestamps);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;
    for row in &filtered.rows {
        writer.write_record([
            format_timestamp(&row.timestamp, date_only),
            row.yhat.to_string(),
            row.yhat_lower.to_string(),
            row.yhat_upper.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ForecastError::IoError(e.into_error()))?;
    debug!(rows = filtered.len(), bytes = bytes.len(), "serialized forecast");
    Ok(bytes)
}

#[derive(Debug, Deserialize)]
struct ExportRecord {
    ds: String,
    yhat: f64,
    yhat_lower: f64,
    yhat_upper: f64,
}

/// Read back a file written by [`serialize`]
pub fn parse_forecast_csv(bytes: &[u8]) -> Result<Vec<ForecastRow>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers()?.clone();
    if headers.iter().ne(EXPORT_HEADER) {
        return Err(ForecastError::IngestionError(format!(
            "Expected header {}, found {}",
            EXPORT_HEADER.join(","),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    reader
        .deserialize::<ExportRecord>()
        .map(|record| -> Result<ForecastRow> {
            let record = record?;
            let timestamp = parse_timestamp(&record.ds).ok_or_else(|| {
                ForecastError::IngestionError(format!("Invalid timestamp '{}'", record.ds))
            })?;
            Ok(ForecastRow {
                timestamp,
                yhat: record.yhat,
                yhat_lower: record.yhat_lower,
                yhat_upper: record.yhat_upper,
            })
        })
        .collect()
}

/// A file ready to be offered for download
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DownloadArtifact {
    /// Serialize a filtered forecast into `forecast_data.csv`
    pub fn from_forecast(filtered: &FilteredForecast) -> Result<Self> {
        Ok(Self {
            file_name: EXPORT_FILE_NAME.to_string(),
            mime: EXPORT_MIME.to_string(),
            bytes: serialize(filtered)?,
        })
    }
}
