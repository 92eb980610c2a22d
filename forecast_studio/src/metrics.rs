//! Metrics for evaluating cross-validated forecasts
//!
//! Errors are grouped by horizon (the distance between a cutoff and the
//! predicted timestamp) and smoothed with a trailing rolling window over
//! the sorted horizons.

use crate::cross_validation::{CrossValidationResult, CrossValidationRow};
use crate::error::{ForecastError, Result};
use chrono::Duration;
use serde::Serialize;
use series_math::rolling::{rolling_mean_by_group, rolling_median_by_group};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Rolling window used for the headline summary
pub const SUMMARY_ROLLING_WINDOW: f64 = 0.1;

/// Actuals closer to zero than this make percentage errors undefined
const PERCENTAGE_EPSILON: f64 = 1e-8;

/// Error measures reported per horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Mse,
    Rmse,
    Mae,
    Mape,
    Mdape,
    Smape,
    Coverage,
}

impl Metric {
    /// Every metric in report order
    pub const ALL: [Metric; 7] = [
        Metric::Mse,
        Metric::Rmse,
        Metric::Mae,
        Metric::Mape,
        Metric::Mdape,
        Metric::Smape,
        Metric::Coverage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Mse => "mse",
            Metric::Rmse => "rmse",
            Metric::Mae => "mae",
            Metric::Mape => "mape",
            Metric::Mdape => "mdape",
            Metric::Smape => "smape",
            Metric::Coverage => "coverage",
        }
    }

    /// Error of a single prediction, as plotted in metric charts.
    ///
    /// `None` for percentage errors of a zero actual.
    pub fn pointwise(&self, row: &CrossValidationRow) -> Option<f64> {
        let error = row.predicted - row.actual;
        match self {
            Metric::Mse => Some(error * error),
            Metric::Rmse => Some(error.abs()),
            Metric::Mae => Some(error.abs()),
            Metric::Mape | Metric::Mdape => {
                if row.actual.abs() < PERCENTAGE_EPSILON {
                    None
                } else {
                    Some((error / row.actual).abs())
                }
            }
            Metric::Smape => Some(symmetric_percentage_error(row.actual, row.predicted)),
            Metric::Coverage => Some(if is_covered(row) { 1.0 } else { 0.0 }),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Metric {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .iter()
            .copied()
            .find(|metric| metric.name() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| ForecastError::InvalidParameter(format!("Unknown metric '{}'", s)))
    }
}

/// Metrics for one horizon of the rolling evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonMetrics {
    pub horizon: Duration,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    /// `None` when an actual value is zero
    pub mape: Option<f64>,
    /// `None` when an actual value is zero
    pub mdape: Option<f64>,
    pub smape: f64,
    /// Share of actuals inside the predicted interval
    pub coverage: f64,
}

impl HorizonMetrics {
    /// Horizon in fractional days
    pub fn horizon_days(&self) -> f64 {
        self.horizon.num_seconds() as f64 / 86_400.0
    }

    /// The metric values of this horizon without the horizon itself
    pub fn scores(&self) -> AccuracyMetrics {
        AccuracyMetrics {
            mse: self.mse,
            rmse: self.rmse,
            mae: self.mae,
            mape: self.mape,
            mdape: self.mdape,
            smape: self.smape,
            coverage: self.coverage,
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.scores().value(metric)
    }
}

fn symmetric_percentage_error(actual: f64, predicted: f64) -> f64 {
    let denominator = (actual.abs() + predicted.abs()) / 2.0;
    if denominator == 0.0 {
        0.0
    } else {
        (predicted - actual).abs() / denominator
    }
}

fn is_covered(row: &CrossValidationRow) -> bool {
    row.predicted_lower <= row.actual && row.actual <= row.predicted_upper
}

/// Performance metrics per horizon.
///
/// Rows are sorted by horizon and each output averages the errors of the
/// `floor(rolling_window * n)` nearest records (at least one, at most all)
/// up to that horizon. A negative `rolling_window` skips smoothing and
/// returns one entry per record. Percentage metrics are `None` when any
/// actual is zero.
pub fn performance_metrics(
    cv: &CrossValidationResult,
    rolling_window: f64,
) -> Result<Vec<HorizonMetrics>> {
    if cv.is_empty() {
        return Err(ForecastError::EmptyValidationError(
            "Cross-validation produced no predictions to score".to_string(),
        ));
    }

    let mut rows = cv.rows.clone();
    rows.sort_by_key(|row| row.horizon());
    let n = rows.len();

    let keys: Vec<i64> = rows.iter().map(|row| row.horizon().num_seconds()).collect();
    let percentages_defined = rows.iter().all(|row| row.actual.abs() >= PERCENTAGE_EPSILON);
    let column = |metric: Metric| -> Vec<f64> {
        rows.iter()
            .map(|row| metric.pointwise(row).unwrap_or(f64::NAN))
            .collect()
    };
    let squared = column(Metric::Mse);
    let absolute = column(Metric::Mae);
    let percentage = column(Metric::Mape);
    let symmetric = column(Metric::Smape);
    let covered = column(Metric::Coverage);

    if rolling_window < 0.0 {
        return Ok((0..n)
            .map(|i| HorizonMetrics {
                horizon: rows[i].horizon(),
                mse: squared[i],
                rmse: squared[i].sqrt(),
                mae: absolute[i],
                mape: percentages_defined.then(|| percentage[i]),
                mdape: percentages_defined.then(|| percentage[i]),
                smape: symmetric[i],
                coverage: covered[i],
            })
            .collect());
    }

    let window = ((rolling_window * n as f64).floor() as usize).clamp(1, n);
    let mse = rolling_mean_by_group(&squared, &keys, window)?;
    let mae = rolling_mean_by_group(&absolute, &keys, window)?;
    let smape = rolling_mean_by_group(&symmetric, &keys, window)?;
    let coverage = rolling_mean_by_group(&covered, &keys, window)?;

    let (mape, mdape): (HashMap<i64, f64>, HashMap<i64, f64>) = if percentages_defined {
        (
            rolling_mean_by_group(&percentage, &keys, window)?.into_iter().collect(),
            rolling_median_by_group(&percentage, &keys, window)?.into_iter().collect(),
        )
    } else {
        (HashMap::new(), HashMap::new())
    };

    Ok(mse
        .iter()
        .zip(&mae)
        .zip(&smape)
        .zip(&coverage)
        .map(|((((key, mse), (_, mae)), (_, smape)), (_, coverage))| HorizonMetrics {
            horizon: Duration::seconds(*key),
            mse: *mse,
            rmse: mse.sqrt(),
            mae: *mae,
            mape: mape.get(key).copied(),
            mdape: mdape.get(key).copied(),
            smape: *smape,
            coverage: *coverage,
        })
        .collect())
}

/// Headline accuracy of a cross-validation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Absolute Percentage Error
    pub mape: Option<f64>,
    /// Median Absolute Percentage Error
    pub mdape: Option<f64>,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
    /// Interval coverage
    pub coverage: f64,
}

impl AccuracyMetrics {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Mse => Some(self.mse),
            Metric::Rmse => Some(self.rmse),
            Metric::Mae => Some(self.mae),
            Metric::Mape => self.mape,
            Metric::Mdape => self.mdape,
            Metric::Smape => Some(self.smape),
            Metric::Coverage => Some(self.coverage),
        }
    }
}

impl fmt::Display for AccuracyMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let percent = |v: Option<f64>| match v {
            Some(v) => format!("{:.4}%", v * 100.0),
            None => "undefined (zero actuals)".to_string(),
        };
        writeln!(f, "Forecast Performance Metrics:")?;
        writeln!(f, "  MSE:      {:.4}", self.mse)?;
        writeln!(f, "  RMSE:     {:.4}", self.rmse)?;
        writeln!(f, "  MAE:      {:.4}", self.mae)?;
        writeln!(f, "  MAPE:     {}", percent(self.mape))?;
        writeln!(f, "  MDAPE:    {}", percent(self.mdape))?;
        writeln!(f, "  SMAPE:    {:.4}%", self.smape * 100.0)?;
        writeln!(f, "  Coverage: {:.2}%", self.coverage * 100.0)?;
        Ok(())
    }
}

/// Column means of the performance table at the default rolling window
pub fn summarize(cv: &CrossValidationResult) -> Result<AccuracyMetrics> {
    summarize_with(cv, SUMMARY_ROLLING_WINDOW)
}

/// Column means of the performance table at a chosen rolling window
pub fn summarize_with(cv: &CrossValidationResult, rolling_window: f64) -> Result<AccuracyMetrics> {
    let table = performance_metrics(cv, rolling_window)?;
    Ok(summarize_table(&table))
}

/// Column means of an already computed performance table
pub fn summarize_table(table: &[HorizonMetrics]) -> AccuracyMetrics {
    let n = table.len().max(1) as f64;
    let mean = |f: fn(&HorizonMetrics) -> f64| table.iter().map(f).sum::<f64>() / n;
    let optional_mean = |f: fn(&HorizonMetrics) -> Option<f64>| {
        table
            .iter()
            .map(f)
            .collect::<Option<Vec<f64>>>()
            .filter(|values| !values.is_empty())
            .map(|values| values.iter().sum::<f64>() / values.len() as f64)
    };

    AccuracyMetrics {
        mse: mean(|m| m.mse),
        rmse: mean(|m| m.rmse),
        mae: mean(|m| m.mae),
        mape: optional_mean(|m| m.mape),
        mdape: optional_mean(|m| m.mdape),
        smape: mean(|m| m.smape),
        coverage: mean(|m| m.coverage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(day: i64, actual: f64, predicted: f64) -> CrossValidationRow {
        let cutoff = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        CrossValidationRow {
            timestamp: cutoff + Duration::days(day),
            cutoff,
            actual,
            predicted,
            predicted_lower: predicted - 1.0,
            predicted_upper: predicted + 1.0,
        }
    }

    #[test]
    fn test_pointwise_smape_zero_denominator() {
        assert_eq!(Metric::Smape.pointwise(&row(1, 0.0, 0.0)), Some(0.0));
        assert_eq!(Metric::Mape.pointwise(&row(1, 0.0, 1.0)), None);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("MDAPE".parse::<Metric>().unwrap(), Metric::Mdape);
        assert!("r2".parse::<Metric>().is_err());
    }
}
