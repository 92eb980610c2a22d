//! Fourier seasonalities and the rules that switch them on

use crate::config::SeasonalityToggle;
use chrono::NaiveDateTime;
use serde::Serialize;
use series_math::fourier::fourier_series;

/// A periodic component modeled with a truncated Fourier series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Seasonality {
    pub name: String,
    /// Period in days
    pub period: f64,
    pub fourier_order: usize,
}

impl Seasonality {
    pub fn new(name: &str, period: f64, fourier_order: usize) -> Self {
        Self {
            name: name.to_string(),
            period,
            fourier_order,
        }
    }

    pub fn yearly() -> Self {
        Self::new("yearly", 365.25, 10)
    }

    pub fn weekly() -> Self {
        Self::new("weekly", 7.0, 3)
    }

    pub fn daily() -> Self {
        Self::new("daily", 1.0, 4)
    }

    /// Number of design columns this seasonality contributes
    pub fn columns(&self) -> usize {
        2 * self.fourier_order
    }

    /// Design block for the given timestamps
    pub fn features(&self, timestamps: &[NaiveDateTime]) -> Vec<Vec<f64>> {
        let t: Vec<f64> = timestamps.iter().map(|ts| days_since_epoch(*ts)).collect();
        fourier_series(&t, self.period, self.fourier_order)
    }
}

/// Fractional days since 1970-01-01, so phases do not depend on the data
pub fn days_since_epoch(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp_millis() as f64 / 86_400_000.0
}

/// Seasonal toggles requested for a fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeasonalitySettings {
    pub yearly: SeasonalityToggle,
    pub weekly: SeasonalityToggle,
    pub daily: SeasonalityToggle,
}

impl SeasonalitySettings {
    /// Decide which seasonalities to fit for a history.
    ///
    /// `Auto` enables yearly for at least two years of history, weekly for
    /// at least two weeks sampled more often than weekly, and daily for at
    /// least two days sampled more often than daily.
    pub fn resolve(&self, span_days: f64, min_gap_days: f64) -> Vec<Seasonality> {
        let decide = |toggle: SeasonalityToggle, auto: bool| match toggle {
            SeasonalityToggle::Enabled => true,
            SeasonalityToggle::Disabled => false,
            SeasonalityToggle::Auto => auto,
        };

        let mut active = Vec::new();
        if decide(self.yearly, span_days >= 730.0) {
            active.push(Seasonality::yearly());
        }
        if decide(self.weekly, span_days >= 14.0 && min_gap_days < 7.0) {
            active.push(Seasonality::weekly());
        }
        if decide(self.daily, span_days >= 2.0 && min_gap_days < 1.0) {
            active.push(Seasonality::daily());
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_rules() {
        let settings = SeasonalitySettings::default();

        let names = |active: Vec<Seasonality>| active.into_iter().map(|s| s.name).collect::<Vec<_>>();
        assert_eq!(names(settings.resolve(60.0, 1.0)), vec!["weekly"]);
        assert_eq!(names(settings.resolve(1000.0, 1.0)), vec!["yearly", "weekly"]);
        assert_eq!(names(settings.resolve(10.0, 1.0 / 24.0)), vec!["daily"]);
        assert!(settings.resolve(5000.0, 30.0).len() == 1);
    }

    #[test]
    fn test_explicit_toggles_win() {
        let settings = SeasonalitySettings {
            yearly: SeasonalityToggle::Disabled,
            weekly: SeasonalityToggle::Enabled,
            daily: SeasonalityToggle::Auto,
        };
        let active = settings.resolve(1000.0, 30.0);
        assert_eq!(active, vec![Seasonality::weekly()]);
    }
}
