//! Piecewise linear trend with automatically placed changepoints

use chrono::NaiveDateTime;
use serde::Serialize;

/// Maps timestamps onto `[0, 1]` over the fitted history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    start: NaiveDateTime,
    span_seconds: f64,
}

impl TimeScale {
    /// Scale for a history running from `start` to `end`
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let span_seconds = (end - start).num_seconds() as f64;
        Self {
            start,
            span_seconds: if span_seconds > 0.0 { span_seconds } else { 1.0 },
        }
    }

    /// Position of `ts` in scaled time; values above 1 lie in the future
    pub fn scale(&self, ts: NaiveDateTime) -> f64 {
        (ts - self.start).num_seconds() as f64 / self.span_seconds
    }

    /// Length of the history in days
    pub fn span_days(&self) -> f64 {
        self.span_seconds / 86_400.0
    }
}

/// Indexes of the observations used as potential changepoints.
///
/// Up to `n_changepoints` indexes spread evenly over the first
/// `changepoint_range` share of the history, never including the first
/// observation.
pub fn changepoint_indexes(n_obs: usize, n_changepoints: usize, changepoint_range: f64) -> Vec<usize> {
    let hist_size = (n_obs as f64 * changepoint_range).floor() as usize;
    let n = if n_changepoints + 1 > hist_size {
        hist_size.saturating_sub(1)
    } else {
        n_changepoints
    };
    if n == 0 {
        return Vec::new();
    }

    let last = (hist_size - 1) as f64;
    (1..=n)
        .map(|i| (last * i as f64 / n as f64).round() as usize)
        .collect()
}

/// Fitted trend `k*t + m + Σ δ_j * max(t - s_j, 0)` in scaled units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PiecewiseLinearTrend {
    /// Base growth rate
    pub k: f64,
    /// Offset
    pub m: f64,
    /// Changepoint locations in scaled time
    pub changepoints: Vec<f64>,
    /// Rate adjustments at each changepoint
    pub deltas: Vec<f64>,
}

impl PiecewiseLinearTrend {
    /// Design row `[1, t, max(t - s_1, 0), ...]` matching the coefficient
    /// layout `[m, k, δ_1, ...]`
    pub fn design_row(t: f64, changepoints: &[f64]) -> Vec<f64> {
        let mut row = Vec::with_capacity(2 + changepoints.len());
        row.push(1.0);
        row.push(t);
        row.extend(changepoints.iter().map(|&s| (t - s).max(0.0)));
        row
    }

    /// Trend value at scaled time `t`
    pub fn evaluate(&self, t: f64) -> f64 {
        evaluate_with(self.k, self.m, &self.changepoints, &self.deltas, t)
    }

    /// Mean absolute rate change, used as the scale of future changes
    pub fn mean_abs_delta(&self) -> f64 {
        if self.deltas.is_empty() {
            return 0.0;
        }
        self.deltas.iter().map(|d| d.abs()).sum::<f64>() / self.deltas.len() as f64
    }
}

/// Evaluate a piecewise linear trend for arbitrary changepoints
pub(crate) fn evaluate_with(k: f64, m: f64, changepoints: &[f64], deltas: &[f64], t: f64) -> f64 {
    let adjustment: f64 = changepoints
        .iter()
        .zip(deltas)
        .map(|(&s, &d)| d * (t - s).max(0.0))
        .sum();
    k * t + m + adjustment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changepoint_indexes() {
        assert_eq!(changepoint_indexes(100, 25, 0.8).len(), 25);
        assert_eq!(changepoint_indexes(100, 25, 0.8).last(), Some(&79));
        // 10 observations leave room for 7 changepoints in the first 8
        assert_eq!(changepoint_indexes(10, 25, 0.8), vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(changepoint_indexes(2, 25, 0.8).is_empty());
    }

    #[test]
    fn test_trend_bends_at_changepoint() {
        let trend = PiecewiseLinearTrend {
            k: 1.0,
            m: 0.0,
            changepoints: vec![0.5],
            deltas: vec![-1.0],
        };
        assert!((trend.evaluate(0.5) - 0.5).abs() < 1e-12);
        assert!((trend.evaluate(1.0) - 0.5).abs() < 1e-12);
    }
}
