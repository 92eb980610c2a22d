//! Forecasting models for time series data

use crate::data::Observation;
use crate::error::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod additive;
pub mod seasonality;
pub mod trend;
mod uncertainty;

pub use additive::{AdditiveModel, FittedAdditiveModel};

/// One predicted point with its uncertainty interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    #[serde(rename = "ds")]
    pub timestamp: NaiveDateTime,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

impl ForecastRow {
    /// Whether the point estimate lies inside its interval
    pub fn is_consistent(&self) -> bool {
        self.yhat_lower <= self.yhat && self.yhat <= self.yhat_upper
    }
}

/// Contribution of a named seasonal pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalComponent {
    pub name: String,
    pub values: Vec<f64>,
}

/// Additive decomposition of a prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Components {
    pub timestamps: Vec<NaiveDateTime>,
    pub trend: Vec<f64>,
    pub seasonal: Vec<SeasonalComponent>,
}

impl Components {
    /// Values of one seasonal component, if it was fitted
    pub fn seasonal(&self, name: &str) -> Option<&[f64]> {
        self.seasonal
            .iter()
            .find(|component| component.name == name)
            .map(|component| component.values.as_slice())
    }
}

/// Fitted forecast model
pub trait FittedForecastModel: Debug {
    /// Predict values and intervals at arbitrary timestamps
    fn predict(&self, timestamps: &[NaiveDateTime]) -> Result<Vec<ForecastRow>>;

    /// Trend and seasonal contributions at arbitrary timestamps
    fn components(&self, timestamps: &[NaiveDateTime]) -> Result<Components>;

    /// Observations the model was fitted on, sorted by timestamp
    fn history(&self) -> &[Observation];

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be fitted on observations
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedForecastModel;

    /// Fit the model; observations may arrive in any order
    fn fit(&self, observations: &[Observation]) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}
