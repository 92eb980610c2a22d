//! Rolling-origin cross-validation
//!
//! The history is cut at a series of cutoff dates. For each cutoff a fresh
//! model is fitted on everything up to the cutoff and scored on the
//! observations that fall within the horizon after it.

use crate::data::Observation;
use crate::error::{ForecastError, Result};
use crate::models::{FittedForecastModel, ForecastModel};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};

/// Window sizes of a cross-validation run, all in days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrossValidationWindow {
    pub initial_days: u32,
    pub period_days: u32,
    pub horizon_days: u32,
}

impl CrossValidationWindow {
    pub fn new(initial_days: u32, period_days: u32, horizon_days: u32) -> Self {
        Self {
            initial_days,
            period_days,
            horizon_days,
        }
    }

    /// Minimum training span before the first cutoff
    pub fn initial(&self) -> Duration {
        Duration::days(self.initial_days as i64)
    }

    /// Spacing between cutoffs
    pub fn period(&self) -> Duration {
        Duration::days(self.period_days as i64)
    }

    /// How far past each cutoff predictions are scored
    pub fn horizon(&self) -> Duration {
        Duration::days(self.horizon_days as i64)
    }
}

/// One scored prediction made from a cutoff
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrossValidationRow {
    #[serde(rename = "ds")]
    pub timestamp: NaiveDateTime,
    pub cutoff: NaiveDateTime,
    #[serde(rename = "y")]
    pub actual: f64,
    #[serde(rename = "yhat")]
    pub predicted: f64,
    #[serde(rename = "yhat_lower")]
    pub predicted_lower: f64,
    #[serde(rename = "yhat_upper")]
    pub predicted_upper: f64,
}

impl CrossValidationRow {
    /// Distance between the cutoff and the predicted timestamp
    pub fn horizon(&self) -> Duration {
        self.timestamp - self.cutoff
    }
}

/// Every scored prediction of a cross-validation run, ordered by cutoff
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossValidationResult {
    pub rows: Vec<CrossValidationRow>,
}

impl CrossValidationResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Distinct cutoffs in the order they were evaluated
    pub fn cutoffs(&self) -> Vec<NaiveDateTime> {
        let mut cutoffs: Vec<NaiveDateTime> = Vec::new();
        for row in &self.rows {
            if cutoffs.last() != Some(&row.cutoff) {
                cutoffs.push(row.cutoff);
            }
        }
        cutoffs
    }
}

/// Cutoff dates for a history, earliest first.
///
/// The last cutoff sits one horizon before the end of the history and
/// earlier ones follow every `period`, as long as at least `initial` of
/// history precedes them. When no observation falls within the horizon of
/// a candidate, the candidate jumps back to the latest observation before
/// it minus one horizon.
pub fn generate_cutoffs(
    timestamps: &[NaiveDateTime],
    window: &CrossValidationWindow,
) -> Result<Vec<NaiveDateTime>> {
    let (min, max) = match (timestamps.iter().min(), timestamps.iter().max()) {
        (Some(min), Some(max)) => (*min, *max),
        _ => {
            return Err(ForecastError::ValidationError(
                "No observations to cross-validate".to_string(),
            ))
        }
    };
    let horizon = window.horizon();

    let mut cutoff = max - horizon;
    if cutoff < min {
        return Err(ForecastError::ValidationError(
            "Less data than horizon.".to_string(),
        ));
    }

    let mut result = vec![cutoff];
    while cutoff >= min + window.initial() {
        cutoff -= window.period();
        let covered = timestamps
            .iter()
            .any(|ts| *ts > cutoff && *ts <= cutoff + horizon);
        if !covered && cutoff > min {
            if let Some(closest) = timestamps.iter().filter(|ts| **ts <= cutoff).max() {
                cutoff = *closest - horizon;
            }
        }
        result.push(cutoff);
    }
    result.pop();

    if result.is_empty() {
        return Err(ForecastError::ValidationError(
            "Less data than horizon after initial window. Make horizon or initial shorter."
                .to_string(),
        ));
    }
    result.reverse();
    Ok(result)
}

/// Run rolling-origin cross-validation of `model` over `history`.
///
/// The history must span at least `initial + horizon` days. Each cutoff
/// gets its own fit; nothing is shared with other folds.
pub fn cross_validation<M: ForecastModel>(
    model: &M,
    history: &[Observation],
    window: &CrossValidationWindow,
) -> Result<CrossValidationResult> {
    let timestamps: Vec<NaiveDateTime> = history.iter().map(|obs| obs.timestamp).collect();
    let span = match (timestamps.iter().min(), timestamps.iter().max()) {
        (Some(min), Some(max)) => *max - *min,
        _ => Duration::zero(),
    };
    let required = window.initial() + window.horizon();
    if span < required {
        return Err(ForecastError::ValidationError(format!(
            "need at least {} days of history for the requested cross-validation window \
             (initial {} days + horizon {} days), data spans {} days",
            required.num_days(),
            window.initial_days,
            window.horizon_days,
            span.num_days()
        )));
    }

    let cutoffs = generate_cutoffs(&timestamps, window)?;
    info!(
        folds = cutoffs.len(),
        first = %cutoffs[0],
        "running cross-validation"
    );

    let horizon = window.horizon();
    let mut rows = Vec::new();
    for cutoff in cutoffs {
        let train: Vec<Observation> = history
            .iter()
            .copied()
            .filter(|obs| obs.timestamp <= cutoff)
            .collect();
        if train.len() < 2 {
            return Err(ForecastError::ValidationError(
                "Less than two datapoints before cutoff. Increase initial window.".to_string(),
            ));
        }

        let mut test: Vec<Observation> = history
            .iter()
            .copied()
            .filter(|obs| obs.timestamp > cutoff && obs.timestamp <= cutoff + horizon)
            .collect();
        test.sort_by_key(|obs| obs.timestamp);

        let fitted = model.fit(&train)?;
        let test_timestamps: Vec<NaiveDateTime> = test.iter().map(|obs| obs.timestamp).collect();
        let forecast = fitted.predict(&test_timestamps)?;
        debug!(%cutoff, train = train.len(), test = test.len(), "scored fold");

        rows.extend(test.iter().zip(forecast).map(|(obs, row)| CrossValidationRow {
            timestamp: obs.timestamp,
            cutoff,
            actual: obs.value,
            predicted: row.yhat,
            predicted_lower: row.yhat_lower,
            predicted_upper: row.yhat_upper,
        }));
    }

    Ok(CrossValidationResult { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn days(n: i64) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n).map(|i| start + Duration::days(i)).collect()
    }

    #[test]
    fn test_generate_cutoffs_spacing() {
        let ts = days(100);
        let window = CrossValidationWindow::new(30, 10, 20);
        let cutoffs = generate_cutoffs(&ts, &window).unwrap();

        // Last cutoff is one horizon before the end
        assert_eq!(*cutoffs.last().unwrap(), ts[99] - Duration::days(20));
        assert!(cutoffs.windows(2).all(|w| w[1] - w[0] == Duration::days(10)));
        assert!(cutoffs[0] >= ts[0] + Duration::days(30));
        assert_eq!(cutoffs.len(), 5);
    }

    #[test]
    fn test_generate_cutoffs_skips_gaps() {
        // Observations on days 0..40 and 80..100 only
        let all = days(100);
        let ts: Vec<NaiveDateTime> = all
            .iter()
            .enumerate()
            .filter(|(i, _)| *i < 40 || *i >= 80)
            .map(|(_, t)| *t)
            .collect();
        let window = CrossValidationWindow::new(10, 10, 10);
        let cutoffs = generate_cutoffs(&ts, &window).unwrap();

        for cutoff in &cutoffs {
            let covered = ts
                .iter()
                .any(|t| *t > *cutoff && *t <= *cutoff + Duration::days(10));
            assert!(covered, "cutoff {} has no data in its horizon", cutoff);
        }
    }
}
