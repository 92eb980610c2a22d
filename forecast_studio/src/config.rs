//! Pipeline configuration and per-run parameters

use crate::cross_validation::CrossValidationWindow;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Smallest value accepted for any run parameter
pub const MIN_PARAMETER: u32 = 1;
/// Largest value accepted for any run parameter
pub const MAX_PARAMETER: u32 = 365;
/// Default length of the first cross-validation training window, in days
pub const DEFAULT_CV_INITIAL_DAYS: u32 = 30;
/// Default cross-validation horizon, in days
pub const DEFAULT_CV_HORIZON_DAYS: u32 = 365;

/// Whether a seasonal component is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityToggle {
    /// Decide from the span and spacing of the history
    #[default]
    Auto,
    Enabled,
    Disabled,
}

/// Settings that stay fixed for the lifetime of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Field separator of uploaded files
    pub delimiter: char,
    /// Width of the uncertainty interval around each forecast
    pub interval_width: f64,
    /// Simulated paths used for the interval; 0 uses the normal approximation
    pub uncertainty_samples: usize,
    /// Seed for the interval simulation
    pub seed: u64,
    /// Potential trend changepoints
    pub n_changepoints: usize,
    /// Share of the history in which changepoints may be placed
    pub changepoint_range: f64,
    /// Prior scale on trend rate changes; smaller is stiffer
    pub changepoint_prior_scale: f64,
    /// Prior scale on seasonal coefficients
    pub seasonality_prior_scale: f64,
    pub yearly_seasonality: SeasonalityToggle,
    pub weekly_seasonality: SeasonalityToggle,
    pub daily_seasonality: SeasonalityToggle,
    /// Share of cross-validation records averaged per horizon
    pub rolling_window: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            interval_width: 0.80,
            uncertainty_samples: 1000,
            seed: 0,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly_seasonality: SeasonalityToggle::Auto,
            weekly_seasonality: SeasonalityToggle::Auto,
            daily_seasonality: SeasonalityToggle::Auto,
            rolling_window: 0.1,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its valid range
    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be between 0 and 1, got {}",
                self.interval_width
            )));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.changepoint_prior_scale > 0.0) || !(self.seasonality_prior_scale > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "prior scales must be positive".to_string(),
            ));
        }
        if !self.rolling_window.is_finite() || self.rolling_window > 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "rolling_window must be at most 1, got {}",
                self.rolling_window
            )));
        }
        Ok(())
    }

    /// The delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() && !self.delimiter.is_ascii_alphanumeric() {
            Ok(self.delimiter as u8)
        } else {
            Err(ForecastError::InvalidParameter(format!(
                "delimiter must be a single ASCII punctuation or whitespace character, got {:?}",
                self.delimiter
            )))
        }
    }
}

/// User-supplied parameters for one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastParameters {
    horizon_periods: u32,
    cv_initial_days: u32,
    cv_horizon_days: u32,
    cv_period_days: u32,
}

impl ForecastParameters {
    /// Validate and bundle the run parameters.
    ///
    /// Every value must lie in `[1, 365]`. The cross-validation period is
    /// independent of the forecast horizon.
    pub fn new(
        horizon_periods: u32,
        cv_initial_days: u32,
        cv_horizon_days: u32,
        cv_period_days: u32,
    ) -> Result<Self> {
        for (name, value) in [
            ("horizon_periods", horizon_periods),
            ("cv_initial_days", cv_initial_days),
            ("cv_horizon_days", cv_horizon_days),
            ("cv_period_days", cv_period_days),
        ] {
            if !(MIN_PARAMETER..=MAX_PARAMETER).contains(&value) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} must be between {} and {}, got {}",
                    name, MIN_PARAMETER, MAX_PARAMETER, value
                )));
            }
        }

        Ok(Self {
            horizon_periods,
            cv_initial_days,
            cv_horizon_days,
            cv_period_days,
        })
    }

    /// Parameters with the default cross-validation windows
    pub fn with_horizon(horizon_periods: u32, cv_period_days: u32) -> Result<Self> {
        Self::new(
            horizon_periods,
            DEFAULT_CV_INITIAL_DAYS,
            DEFAULT_CV_HORIZON_DAYS,
            cv_period_days,
        )
    }

    pub fn horizon_periods(&self) -> u32 {
        self.horizon_periods
    }

    pub fn cv_initial_days(&self) -> u32 {
        self.cv_initial_days
    }

    pub fn cv_horizon_days(&self) -> u32 {
        self.cv_horizon_days
    }

    pub fn cv_period_days(&self) -> u32 {
        self.cv_period_days
    }

    /// The cross-validation window described by these parameters
    pub fn cross_validation_window(&self) -> CrossValidationWindow {
        CrossValidationWindow::new(self.cv_initial_days, self.cv_period_days, self.cv_horizon_days)
    }
}

impl Default for ForecastParameters {
    /// One forecast period, 30/365 day windows and a period of half the
    /// cross-validation horizon
    fn default() -> Self {
        Self {
            horizon_periods: 1,
            cv_initial_days: DEFAULT_CV_INITIAL_DAYS,
            cv_horizon_days: DEFAULT_CV_HORIZON_DAYS,
            cv_period_days: DEFAULT_CV_HORIZON_DAYS / 2,
        }
    }
}
