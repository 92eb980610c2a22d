//! # Forecast Studio
//!
//! A Rust library for automated time series forecasting: upload a `ds`/`y`
//! table, fit an additive trend and seasonality model, cross-validate it,
//! and export the forecast.
//!
//! ## Features
//!
//! - Lenient CSV ingestion (unparseable timestamps become missing values)
//! - Additive model with piecewise linear trend and Fourier seasonalities
//! - Rolling-origin cross-validation with per-horizon error metrics
//! - Forecast export restricted to timestamps after the observed data
//! - Serializable chart specifications with fallbacks for bad data
//!
//! ## Pipeline
//!
//! ```text
//! DataLoader -> ForecastService (fit -> cross-validate -> predict)
//!            -> metrics / export / charts
//! ```
//!
//! [`ForecastSession`] owns the data and the fitted model and runs the
//! stages in order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use forecast_studio::{ForecastParameters, ForecastSession, PipelineConfig};
//!
//! # fn main() -> Result<(), forecast_studio::ForecastError> {
//! let bytes = std::fs::read("visits.csv")?;
//! let config = PipelineConfig::default();
//! let mut session = ForecastSession::from_csv_bytes(&bytes, &config)?;
//!
//! // Forecast 30 days ahead; validate on 90 day windows every 30 days
//! let parameters = ForecastParameters::new(30, 180, 90, 30)?;
//! let report = session.run(&parameters)?;
//!
//! println!("{}", report.accuracy);
//! std::fs::write(&report.artifact.file_name, &report.artifact.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod charts;
pub mod config;
pub mod cross_validation;
pub mod data;
pub mod error;
pub mod export;
pub mod metrics;
pub mod models;
pub mod service;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use crate::config::{ForecastParameters, PipelineConfig};
pub use crate::cross_validation::{CrossValidationResult, CrossValidationWindow};
pub use crate::data::{DataLoader, TimeSeriesData};
pub use crate::error::{ForecastError, Result};
pub use crate::export::{DownloadArtifact, FilteredForecast};
pub use crate::metrics::{AccuracyMetrics, Metric};
pub use crate::models::{AdditiveModel, FittedForecastModel, ForecastModel, ForecastRow};
pub use crate::service::{FittedModel, ForecastService};
pub use crate::session::{ForecastSession, PipelineReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
