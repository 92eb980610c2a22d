//! Utility functions for the forecast_studio crate

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::fmt;

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a timestamp cell leniently.
///
/// Accepts ISO dates and date-times (space or `T` separated, optional
/// fractional seconds), RFC 3339 with an offset (converted to UTC) and
/// `YYYY/MM/DD`. Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let text = raw.trim().trim_matches('"').trim();
    if text.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|parsed| parsed.naive_utc())
}

/// Whether every timestamp falls on midnight
pub fn all_midnight(timestamps: &[NaiveDateTime]) -> bool {
    timestamps.iter().all(|ts| ts.time() == NaiveTime::MIN)
}

/// Format a timestamp the way exported files show it: the bare date when
/// `date_only` is set, otherwise date and time to the second.
pub fn format_timestamp(ts: &NaiveDateTime, date_only: bool) -> String {
    if date_only {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Sampling frequency of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// A fixed step such as one day or one hour
    Fixed(Duration),
    /// Calendar months (28 to 31 days apart)
    Monthly,
}

impl Frequency {
    /// Daily sampling, the fallback for a series without a usable gap
    pub fn daily() -> Self {
        Frequency::Fixed(Duration::days(1))
    }

    /// Infer the frequency of sorted timestamps.
    ///
    /// Uses the most common positive gap (the smallest one on ties). When
    /// every gap is between 28 and 31 days the series is taken as monthly.
    pub fn infer(sorted: &[NaiveDateTime]) -> Result<Self> {
        let gaps: Vec<Duration> = sorted
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .filter(|gap| *gap > Duration::zero())
            .collect();

        if gaps.is_empty() {
            return Err(ForecastError::ValidationError(
                "Need at least two distinct timestamps to infer the sampling frequency".to_string(),
            ));
        }

        if gaps
            .iter()
            .all(|gap| (28..=31).contains(&gap.num_days()) && gap.num_seconds() % 86_400 == 0)
        {
            return Ok(Frequency::Monthly);
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for gap in &gaps {
            *counts.entry(gap.num_seconds()).or_insert(0) += 1;
        }
        let (seconds, _) = counts
            .into_iter()
            .max_by(|(a_secs, a_count), (b_secs, b_count)| {
                a_count.cmp(b_count).then(b_secs.cmp(a_secs))
            })
            .unwrap_or((86_400, 0));

        Ok(Frequency::Fixed(Duration::seconds(seconds)))
    }

    /// The `steps`-th timestamp after `start`
    pub fn advance(&self, start: NaiveDateTime, steps: u32) -> Option<NaiveDateTime> {
        match self {
            Frequency::Fixed(step) => start.checked_add_signed(*step * steps as i32),
            Frequency::Monthly => start.checked_add_months(Months::new(steps)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Fixed(step) if step.num_seconds() % 86_400 == 0 => {
                write!(f, "every {} day(s)", step.num_days())
            }
            Frequency::Fixed(step) => write!(f, "every {} second(s)", step.num_seconds()),
        }
    }
}

/// Create future timestamps for forecasting
pub fn future_timestamps(
    last_timestamp: NaiveDateTime,
    horizon: u32,
    frequency: Frequency,
) -> Result<Vec<NaiveDateTime>> {
    (1..=horizon)
        .map(|step| {
            frequency.advance(last_timestamp, step).ok_or_else(|| {
                ForecastError::ValidationError(format!(
                    "Forecast horizon of {} steps ({}) runs past the supported date range",
                    horizon, frequency
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2020-01-05"), Some(date(2020, 1, 5)));
        assert_eq!(parse_timestamp(" 2020/01/05 "), Some(date(2020, 1, 5)));
        assert_eq!(
            parse_timestamp("2020-01-05 13:30:00"),
            date(2020, 1, 5).checked_add_signed(Duration::minutes(810))
        );
        assert_eq!(
            parse_timestamp("2020-01-05T13:30:00+01:00"),
            date(2020, 1, 5).checked_add_signed(Duration::minutes(750))
        );
        assert_eq!(parse_timestamp("not-a-date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_infer_monthly_and_daily() {
        let monthly = vec![date(2021, 1, 1), date(2021, 2, 1), date(2021, 3, 1)];
        assert_eq!(Frequency::infer(&monthly).unwrap(), Frequency::Monthly);

        let daily = vec![date(2021, 1, 1), date(2021, 1, 2), date(2021, 1, 4), date(2021, 1, 5)];
        assert_eq!(Frequency::infer(&daily).unwrap(), Frequency::daily());

        assert!(Frequency::infer(&[date(2021, 1, 1)]).is_err());
    }

    #[test]
    fn test_future_timestamps_monthly_keeps_calendar() {
        let future = future_timestamps(date(2021, 1, 31), 2, Frequency::Monthly).unwrap();
        assert_eq!(future, vec![date(2021, 2, 28), date(2021, 3, 31)]);
    }
}
