use chrono::{Duration, NaiveDate, NaiveDateTime};
use forecast_studio::cross_validation::{cross_validation, generate_cutoffs, CrossValidationWindow};
use forecast_studio::data::{Observation, TimeSeriesData};
use forecast_studio::models::AdditiveModel;
use forecast_studio::{ForecastError, ForecastParameters, ForecastService};
use pretty_assertions::assert_eq;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn daily(days: impl IntoIterator<Item = i64>) -> Vec<Observation> {
    days.into_iter()
        .map(|i| Observation {
            timestamp: start() + Duration::days(i),
            value: 20.0 + 0.5 * i as f64 + (i % 7) as f64,
        })
        .collect()
}

fn fast_model() -> AdditiveModel {
    AdditiveModel::new().with_uncertainty_samples(0)
}

#[test]
fn test_short_history_is_rejected_with_default_window() {
    // 2020-01-01 .. 2020-03-01 spans 60 days, far below 30 + 365
    let observations = daily(0..61);
    let data = TimeSeriesData::new(
        observations.iter().map(|o| o.timestamp).collect(),
        observations.iter().map(|o| o.value).collect(),
    )
    .unwrap();

    let service = ForecastService::new(fast_model());
    let fitted = service.fit(&data).unwrap();
    let window = ForecastParameters::default().cross_validation_window();

    match service.cross_validate(&fitted, &window) {
        Err(ForecastError::ValidationError(message)) => {
            assert!(message.contains("need at least 395 days"), "{}", message);
            assert!(message.contains("data spans 60 days"), "{}", message);
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[test]
fn test_folds_respect_cutoffs() {
    let observations = daily(0..120);
    let window = CrossValidationWindow::new(30, 10, 20);
    let result = cross_validation(&fast_model(), &observations, &window).unwrap();

    let cutoffs = result.cutoffs();
    assert_eq!(cutoffs.len(), 7);
    assert_eq!(*cutoffs.last().unwrap(), start() + Duration::days(99));

    for row in &result.rows {
        assert!(row.timestamp > row.cutoff);
        assert!(row.horizon() <= Duration::days(20));
        assert!(row.predicted_lower <= row.predicted && row.predicted <= row.predicted_upper);
    }
    // Every cutoff scores a full horizon of daily observations
    assert_eq!(result.len(), 7 * 20);
}

#[test]
fn test_cutoffs_are_oldest_first() {
    let timestamps: Vec<NaiveDateTime> = daily(0..120).iter().map(|o| o.timestamp).collect();
    let cutoffs = generate_cutoffs(&timestamps, &CrossValidationWindow::new(30, 10, 20)).unwrap();
    assert!(cutoffs.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_horizon_longer_than_history() {
    let timestamps: Vec<NaiveDateTime> = daily(0..10).iter().map(|o| o.timestamp).collect();
    let result = generate_cutoffs(&timestamps, &CrossValidationWindow::new(1, 1, 30));
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
}

#[test]
fn test_sparse_early_history_needs_longer_initial_window() {
    // One lone observation, then a month of daily data
    let observations = daily(std::iter::once(0).chain(100..=130));
    let window = CrossValidationWindow::new(1, 5, 10);

    match cross_validation(&fast_model(), &observations, &window) {
        Err(ForecastError::ValidationError(message)) => {
            assert_eq!(
                message,
                "Less than two datapoints before cutoff. Increase initial window."
            )
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[test]
fn test_fold_fit_ignores_future_rows() {
    // A jump after day 80 must not leak into folds that end before it
    let mut observations = daily(0..120);
    for obs in observations.iter_mut().filter(|o| o.timestamp > start() + Duration::days(80)) {
        obs.value += 1000.0;
    }
    let window = CrossValidationWindow::new(30, 10, 5);
    let result = cross_validation(&fast_model(), &observations, &window).unwrap();

    let early: Vec<_> = result
        .rows
        .iter()
        .filter(|row| row.timestamp <= start() + Duration::days(80))
        .collect();
    assert!(!early.is_empty());
    assert!(early.iter().all(|row| row.predicted < 500.0));
}
