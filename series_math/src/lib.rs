//! # Series Math
//!
//! Numeric building blocks used when fitting and evaluating time series
//! models. The crate has no notion of timestamps: callers convert their
//! time axis to plain `f64` before calling into it.

use thiserror::Error;

pub mod fourier;
pub mod least_squares;
pub mod rolling;
pub mod stats;

/// Errors that can occur in numeric routines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
