//! Fit, cross-validate and predict with a forecasting model

use crate::config::PipelineConfig;
use crate::cross_validation::{cross_validation, CrossValidationResult, CrossValidationWindow};
use crate::data::{Observation, TimeSeriesData};
use crate::error::{ForecastError, Result};
use crate::models::{AdditiveModel, Components, FittedForecastModel, ForecastModel, ForecastRow};
use crate::utils::{future_timestamps, Frequency};
use chrono::NaiveDateTime;
use tracing::info;

/// A fitted model together with what is needed to extend its history
#[derive(Debug, Clone)]
pub struct FittedModel<F> {
    inner: F,
    frequency: Frequency,
    max_observed: NaiveDateTime,
}

impl<F: FittedForecastModel> FittedModel<F> {
    /// The underlying fitted model
    pub fn model(&self) -> &F {
        &self.inner
    }

    /// Sampling frequency inferred from the history
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Latest timestamp of the data the model was fitted on
    pub fn max_observed(&self) -> NaiveDateTime {
        self.max_observed
    }

    /// Observations used for fitting, sorted by timestamp
    pub fn history(&self) -> &[Observation] {
        self.inner.history()
    }
}

/// Runs the model stages; holds no state between calls
#[derive(Debug, Clone)]
pub struct ForecastService<M = AdditiveModel> {
    model: M,
}

impl ForecastService<AdditiveModel> {
    /// Service around the additive model configured by `config`
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self::new(AdditiveModel::from_config(config)?))
    }
}

impl<M: ForecastModel> ForecastService<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// The unfitted model used for every fit
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Fit the model on the usable rows of `data`
    pub fn fit(&self, data: &TimeSeriesData) -> Result<FittedModel<M::Fitted>> {
        let inner = self.model.fit(&data.observations())?;
        let history = inner.history();
        let timestamps: Vec<NaiveDateTime> = history.iter().map(|obs| obs.timestamp).collect();
        let frequency = Frequency::infer(&timestamps)?;
        let last = *timestamps.last().ok_or_else(|| {
            ForecastError::ModelFitError("Model returned an empty history".to_string())
        })?;
        let max_observed = data.max_timestamp().map_or(last, |max| max.max(last));

        info!(
            model = self.model.name(),
            observations = history.len(),
            %frequency,
            "model fitted"
        );

        Ok(FittedModel {
            inner,
            frequency,
            max_observed,
        })
    }

    /// Rolling-origin cross-validation on the history of `fitted`
    pub fn cross_validate(
        &self,
        fitted: &FittedModel<M::Fitted>,
        window: &CrossValidationWindow,
    ) -> Result<CrossValidationResult> {
        let result = cross_validation(&self.model, fitted.history(), window)?;
        info!(rows = result.len(), "cross-validation finished");
        Ok(result)
    }

    /// Predict the history followed by `horizon_periods` future steps
    pub fn predict(
        &self,
        fitted: &FittedModel<M::Fitted>,
        horizon_periods: u32,
    ) -> Result<Vec<ForecastRow>> {
        let mut timestamps: Vec<NaiveDateTime> =
            fitted.history().iter().map(|obs| obs.timestamp).collect();
        // Dated rows without a value still extend the history
        timestamps.extend(future_timestamps(
            fitted.max_observed,
            horizon_periods,
            fitted.frequency,
        )?);
        fitted.inner.predict(&timestamps)
    }

    /// Trend and seasonal contributions at `timestamps`
    pub fn components(
        &self,
        fitted: &FittedModel<M::Fitted>,
        timestamps: &[NaiveDateTime],
    ) -> Result<Components> {
        fitted.inner.components(timestamps)
    }
}
