//! Additive trend plus seasonality model
//!
//! The series is decomposed as `y(t) = trend(t) + Σ seasonal(t) + noise`.
//! The trend is piecewise linear with changepoints placed over the early
//! part of the history; seasonalities are Fourier series on calendar time.
//! Coefficients come from a penalized least-squares fit: a first pass
//! without changepoints estimates the noise level, a second pass fits
//! everything with ridge penalties that play the role of priors.

use super::seasonality::{Seasonality, SeasonalitySettings};
use super::trend::{changepoint_indexes, PiecewiseLinearTrend, TimeScale};
use super::uncertainty::IntervalSimulation;
use super::{Components, FittedForecastModel, ForecastModel, ForecastRow, SeasonalComponent};
use crate::config::PipelineConfig;
use crate::data::Observation;
use crate::error::{ForecastError, Result};
use chrono::NaiveDateTime;
use series_math::fourier::hstack;
use series_math::least_squares::{solve_ols, solve_penalized};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

/// Penalty on the offset and base growth rate
const FREE_PENALTY: f64 = 1e-10;
/// Lower bound on the first-pass residual variance, in scaled units
const MIN_RESIDUAL_VARIANCE: f64 = 1e-6;

/// Unfitted additive model with its hyper-parameters
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    name: String,
    n_changepoints: usize,
    changepoint_range: f64,
    changepoint_prior_scale: f64,
    seasonality_prior_scale: f64,
    seasonality: SeasonalitySettings,
    interval_width: f64,
    uncertainty_samples: usize,
    seed: u64,
}

impl Default for AdditiveModel {
    fn default() -> Self {
        Self::new()
    }
}

impl AdditiveModel {
    /// Model with the default hyper-parameters
    pub fn new() -> Self {
        let config = PipelineConfig::default();
        Self::build(&config)
    }

    /// Model configured from a validated pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &PipelineConfig) -> Self {
        Self {
            name: "Additive Trend-Seasonality".to_string(),
            n_changepoints: config.n_changepoints,
            changepoint_range: config.changepoint_range,
            changepoint_prior_scale: config.changepoint_prior_scale,
            seasonality_prior_scale: config.seasonality_prior_scale,
            seasonality: SeasonalitySettings {
                yearly: config.yearly_seasonality,
                weekly: config.weekly_seasonality,
                daily: config.daily_seasonality,
            },
            interval_width: config.interval_width,
            uncertainty_samples: config.uncertainty_samples,
            seed: config.seed,
        }
    }

    /// Use a different interval width
    pub fn with_interval_width(mut self, interval_width: f64) -> Result<Self> {
        if !(interval_width > 0.0 && interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be between 0 and 1, got {}",
                interval_width
            )));
        }
        self.interval_width = interval_width;
        Ok(self)
    }

    /// Use a different number of simulated paths; 0 switches to the
    /// normal approximation
    pub fn with_uncertainty_samples(mut self, samples: usize) -> Self {
        self.uncertainty_samples = samples;
        self
    }

    /// Override the seasonality toggles
    pub fn with_seasonality(mut self, settings: SeasonalitySettings) -> Self {
        self.seasonality = settings;
        self
    }

    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }

    pub fn uncertainty_samples(&self) -> usize {
        self.uncertainty_samples
    }

    /// Keep usable rows, sort them and reject duplicates
    fn prepare_history(observations: &[Observation]) -> Result<Vec<Observation>> {
        let mut history: Vec<Observation> = observations
            .iter()
            .copied()
            .filter(|obs| obs.value.is_finite())
            .collect();

        if history.len() < 2 {
            return Err(ForecastError::ModelFitError(
                "Dataframe has less than 2 non-NaN rows.".to_string(),
            ));
        }

        history.sort_by_key(|obs| obs.timestamp);
        if let Some(pair) = history
            .windows(2)
            .find(|pair| pair[0].timestamp == pair[1].timestamp)
        {
            return Err(ForecastError::ModelFitError(format!(
                "Timestamp {} appears more than once; each timestamp must be unique",
                pair[0].timestamp
            )));
        }
        Ok(history)
    }
}

fn least_squares_failure(err: series_math::MathError) -> ForecastError {
    ForecastError::ModelFitError(format!("Could not solve for model coefficients: {}", err))
}

/// Seasonal design block, one empty row per timestamp when nothing is active
fn seasonal_design(seasonalities: &[Seasonality], timestamps: &[NaiveDateTime]) -> Vec<Vec<f64>> {
    if seasonalities.is_empty() {
        return vec![Vec::new(); timestamps.len()];
    }
    let blocks: Vec<Vec<Vec<f64>>> = seasonalities.iter().map(|s| s.features(timestamps)).collect();
    hstack(&blocks)
}

fn dot(row: &[f64], coefficients: &[f64]) -> f64 {
    row.iter().zip(coefficients).map(|(x, b)| x * b).sum()
}

impl ForecastModel for AdditiveModel {
    type Fitted = FittedAdditiveModel;

    fn fit(&self, observations: &[Observation]) -> Result<Self::Fitted> {
        let history = Self::prepare_history(observations)?;
        let n = history.len();
        let timestamps: Vec<NaiveDateTime> = history.iter().map(|obs| obs.timestamp).collect();

        let scale = TimeScale::new(timestamps[0], timestamps[n - 1]);
        let y_scale = history
            .iter()
            .map(|obs| obs.value.abs())
            .fold(0.0, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let t: Vec<f64> = timestamps.iter().map(|ts| scale.scale(*ts)).collect();
        let y: Vec<f64> = history.iter().map(|obs| obs.value / y_scale).collect();

        let min_gap_days = timestamps
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_seconds() as f64 / 86_400.0)
            .fold(f64::INFINITY, f64::min);
        let seasonalities = self.seasonality.resolve(scale.span_days(), min_gap_days);
        let seasonal = seasonal_design(&seasonalities, &timestamps);
        let n_seasonal: usize = seasonalities.iter().map(Seasonality::columns).sum();

        // First pass: straight line plus seasonality, for the noise level
        let base_design: Vec<Vec<f64>> = t
            .iter()
            .zip(&seasonal)
            .map(|(&ti, row)| {
                let mut full = vec![1.0, ti];
                full.extend_from_slice(row);
                full
            })
            .collect();
        let base = solve_ols(&base_design, &y).map_err(least_squares_failure)?;
        let residual_variance = base_design
            .iter()
            .zip(&y)
            .map(|(row, yi)| (yi - dot(row, &base)).powi(2))
            .sum::<f64>()
            / n as f64;
        let residual_variance = residual_variance.max(MIN_RESIDUAL_VARIANCE);

        // Second pass: changepoints and seasonality shrunk towards zero
        let changepoints: Vec<f64> =
            changepoint_indexes(n, self.n_changepoints, self.changepoint_range)
                .into_iter()
                .map(|i| t[i])
                .collect();
        let design: Vec<Vec<f64>> = t
            .iter()
            .zip(&seasonal)
            .map(|(&ti, row)| {
                let mut full = PiecewiseLinearTrend::design_row(ti, &changepoints);
                full.extend_from_slice(row);
                full
            })
            .collect();

        let changepoint_penalty = residual_variance / self.changepoint_prior_scale.powi(2);
        let seasonal_penalty = residual_variance / self.seasonality_prior_scale.powi(2);
        let mut penalties = vec![FREE_PENALTY; 2];
        penalties.extend(std::iter::repeat(changepoint_penalty).take(changepoints.len()));
        penalties.extend(std::iter::repeat(seasonal_penalty).take(n_seasonal));

        let coefficients = solve_penalized(&design, &y, &penalties).map_err(least_squares_failure)?;
        let sigma_obs = (design
            .iter()
            .zip(&y)
            .map(|(row, yi)| (yi - dot(row, &coefficients)).powi(2))
            .sum::<f64>()
            / n as f64)
            .sqrt();

        let n_trend = 2 + changepoints.len();
        let trend = PiecewiseLinearTrend {
            m: coefficients[0],
            k: coefficients[1],
            deltas: coefficients[2..n_trend].to_vec(),
            changepoints,
        };

        debug!(
            observations = n,
            changepoints = trend.changepoints.len(),
            seasonalities = ?seasonalities.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            sigma_obs,
            "fitted additive model"
        );

        Ok(FittedAdditiveModel {
            name: self.name.clone(),
            history,
            scale,
            y_scale,
            trend,
            seasonalities,
            beta: coefficients[n_trend..].to_vec(),
            sigma_obs,
            interval_width: self.interval_width,
            uncertainty_samples: self.uncertainty_samples,
            seed: self.seed,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Additive model fitted to a history
#[derive(Debug, Clone)]
pub struct FittedAdditiveModel {
    name: String,
    history: Vec<Observation>,
    scale: TimeScale,
    y_scale: f64,
    trend: PiecewiseLinearTrend,
    seasonalities: Vec<Seasonality>,
    beta: Vec<f64>,
    sigma_obs: f64,
    interval_width: f64,
    uncertainty_samples: usize,
    seed: u64,
}

impl FittedAdditiveModel {
    /// The fitted trend, in scaled units
    pub fn trend(&self) -> &PiecewiseLinearTrend {
        &self.trend
    }

    /// Seasonalities included in the fit
    pub fn seasonalities(&self) -> &[Seasonality] {
        &self.seasonalities
    }

    /// Residual standard deviation in the units of the data
    pub fn sigma_obs(&self) -> f64 {
        self.sigma_obs * self.y_scale
    }

    fn normal_intervals(&self, yhat: &[f64]) -> Result<Vec<(f64, f64)>> {
        let standard = Normal::new(0.0, 1.0).map_err(|e| {
            ForecastError::InvalidParameter(format!("Invalid normal distribution: {}", e))
        })?;
        let margin = standard.inverse_cdf(0.5 + self.interval_width / 2.0) * self.sigma_obs();
        Ok(yhat.iter().map(|&v| (v - margin, v + margin)).collect())
    }
}

impl FittedForecastModel for FittedAdditiveModel {
    fn predict(&self, timestamps: &[NaiveDateTime]) -> Result<Vec<ForecastRow>> {
        if timestamps.is_empty() {
            return Ok(Vec::new());
        }

        let components = self.components(timestamps)?;
        let seasonal_total: Vec<f64> = (0..timestamps.len())
            .map(|i| components.seasonal.iter().map(|c| c.values[i]).sum())
            .collect();
        let yhat: Vec<f64> = components
            .trend
            .iter()
            .zip(&seasonal_total)
            .map(|(trend, seasonal)| trend + seasonal)
            .collect();

        let intervals = if self.uncertainty_samples == 0 {
            self.normal_intervals(&yhat)?
        } else {
            let t: Vec<f64> = timestamps.iter().map(|ts| self.scale.scale(*ts)).collect();
            IntervalSimulation {
                trend: &self.trend,
                t: &t,
                seasonal: &seasonal_total,
                y_scale: self.y_scale,
                sigma_obs: self.sigma_obs,
                samples: self.uncertainty_samples,
                interval_width: self.interval_width,
                seed: self.seed,
            }
            .run()?
        };

        Ok(timestamps
            .iter()
            .zip(yhat)
            .zip(intervals)
            .map(|((&timestamp, yhat), (lower, upper))| ForecastRow {
                timestamp,
                yhat,
                yhat_lower: lower.min(yhat),
                yhat_upper: upper.max(yhat),
            })
            .collect())
    }

    fn components(&self, timestamps: &[NaiveDateTime]) -> Result<Components> {
        let trend = timestamps
            .iter()
            .map(|ts| self.trend.evaluate(self.scale.scale(*ts)) * self.y_scale)
            .collect();

        let mut offset = 0;
        let seasonal = self
            .seasonalities
            .iter()
            .map(|seasonality| {
                let beta = &self.beta[offset..offset + seasonality.columns()];
                offset += seasonality.columns();
                SeasonalComponent {
                    name: seasonality.name.clone(),
                    values: seasonality
                        .features(timestamps)
                        .iter()
                        .map(|row| dot(row, beta) * self.y_scale)
                        .collect(),
                }
            })
            .collect();

        Ok(Components {
            timestamps: timestamps.to_vec(),
            trend,
            seasonal,
        })
    }

    fn history(&self) -> &[Observation] {
        &self.history
    }

    fn name(&self) -> &str {
        &self.name
    }
}
