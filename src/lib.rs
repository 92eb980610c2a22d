//! # Forecast Studio Workspace
//!
//! Umbrella crate for the forecasting workspace. It re-exports the member
//! crates so applications can depend on a single package:
//!
//! - [`forecast_studio`]: ingestion, model fitting, cross-validation,
//!   metrics, export and charts
//! - [`series_math`]: the numeric routines underneath
//!
//! ## Example
//!
//! ```
//! use forecast_studio_workspace::forecast_studio::DataLoader;
//! use forecast_studio_workspace::series_math::stats::median;
//!
//! let data = DataLoader::load(b"ds;y\n2024-01-01;3\n2024-01-02;5\n2024-01-03;4\n", b';').unwrap();
//! assert_eq!(data.len(), 3);
//! assert_eq!(median(&data.values()).unwrap(), 4.0);
//! ```

pub use forecast_studio;
pub use series_math;

/// Version of the workspace facade
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
