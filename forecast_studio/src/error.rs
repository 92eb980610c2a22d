//! Error types for the forecast_studio crate

use polars::prelude::PolarsError;
use series_math::MathError;
use thiserror::Error;

/// Custom error types for the forecast_studio crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The uploaded file could not be read as a `ds`/`y` table
    #[error("Ingestion error: {0}")]
    IngestionError(String),

    /// The forecasting model rejected the series
    #[error("Model fit error: {0}")]
    ModelFitError(String),

    /// The history is too short for the requested cross-validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Cross-validation produced nothing to summarize
    #[error("Empty validation error: {0}")]
    EmptyValidationError(String),

    /// A chart could not be built from the data it was given
    #[error("Chart render error: {0}")]
    ChartRenderError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV serialization
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from numeric routines
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl ForecastError {
    /// Whether the error ends a pipeline run (everything except chart
    /// failures, which are rendered with a fallback instead)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ForecastError::ChartRenderError(_))
    }
}
