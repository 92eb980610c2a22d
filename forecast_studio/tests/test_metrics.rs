use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use forecast_studio::cross_validation::{CrossValidationResult, CrossValidationRow};
use forecast_studio::metrics::{performance_metrics, summarize, summarize_with, Metric};
use forecast_studio::ForecastError;
use pretty_assertions::assert_eq;

fn cutoff() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn row(day: i64, actual: f64, predicted: f64) -> CrossValidationRow {
    CrossValidationRow {
        timestamp: cutoff() + Duration::days(day),
        cutoff: cutoff(),
        actual,
        predicted,
        predicted_lower: predicted - 1.0,
        predicted_upper: predicted + 1.0,
    }
}

/// Errors 1, 2, 3, 4 at horizons 1..4 days; only the first is covered
fn simple_result() -> CrossValidationResult {
    CrossValidationResult {
        rows: vec![
            row(3, 10.0, 13.0),
            row(1, 10.0, 11.0),
            row(4, 10.0, 14.0),
            row(2, 10.0, 12.0),
        ],
    }
}

#[test]
fn test_rolling_window_of_two() {
    let table = performance_metrics(&simple_result(), 0.5).unwrap();

    let horizons: Vec<f64> = table.iter().map(|m| m.horizon_days()).collect();
    assert_eq!(horizons, vec![2.0, 3.0, 4.0]);

    let mae: Vec<f64> = table.iter().map(|m| m.mae).collect();
    assert_eq!(mae, vec![1.5, 2.5, 3.5]);
    let mse: Vec<f64> = table.iter().map(|m| m.mse).collect();
    assert_eq!(mse, vec![2.5, 6.5, 12.5]);
    assert_relative_eq!(table[0].rmse, 2.5f64.sqrt());

    assert_relative_eq!(table[0].mape.unwrap(), 0.15, epsilon = 1e-12);
    assert_relative_eq!(table[2].mdape.unwrap(), 0.35, epsilon = 1e-12);
    assert_eq!(table[0].coverage, 0.5);
    assert_eq!(table[1].coverage, 0.0);
}

#[test]
fn test_small_window_is_clamped_to_one() {
    let table = performance_metrics(&simple_result(), 0.1).unwrap();
    assert_eq!(table.len(), 4);
    let mae: Vec<f64> = table.iter().map(|m| m.mae).collect();
    assert_eq!(mae, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_negative_window_returns_every_record() {
    let table = performance_metrics(&simple_result(), -1.0).unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table[3].mse, 16.0);
    assert_relative_eq!(table[3].smape, 4.0 / 12.0, epsilon = 1e-12);
}

#[test]
fn test_summary_is_mean_of_table() {
    let summary = summarize_with(&simple_result(), 0.5).unwrap();
    assert_relative_eq!(summary.mae, 2.5, epsilon = 1e-12);
    assert_relative_eq!(summary.mse, (2.5 + 6.5 + 12.5) / 3.0, epsilon = 1e-12);
    assert_relative_eq!(summary.mape.unwrap(), 0.25, epsilon = 1e-12);
    assert_relative_eq!(summary.mdape.unwrap(), 0.25, epsilon = 1e-12);

    let text = summary.to_string();
    assert!(text.contains("MAE:"));
    assert!(text.contains("25.0000%"));
}

#[test]
fn test_zero_actuals_drop_percentage_metrics() {
    let cv = CrossValidationResult {
        rows: vec![row(1, 0.0, 1.0), row(2, 5.0, 6.0), row(3, 5.0, 4.0)],
    };
    let summary = summarize(&cv).unwrap();

    assert_eq!(summary.mape, None);
    assert_eq!(summary.mdape, None);
    assert!(summary.mse.is_finite());
    assert!(summary.to_string().contains("undefined"));
    assert_eq!(summary.value(Metric::Mape), None);
    assert_eq!(summary.value(Metric::Mae), Some(1.0));
}

#[test]
fn test_empty_validation() {
    let empty = CrossValidationResult::default();
    assert!(matches!(
        summarize(&empty),
        Err(ForecastError::EmptyValidationError(_))
    ));
    assert!(matches!(
        performance_metrics(&empty, 0.1),
        Err(ForecastError::EmptyValidationError(_))
    ));
}

#[test]
fn test_equal_horizons_are_grouped() {
    let second_cutoff = cutoff() + Duration::days(10);
    let mut rows = vec![row(1, 10.0, 12.0), row(2, 10.0, 14.0)];
    rows.push(CrossValidationRow {
        timestamp: second_cutoff + Duration::days(1),
        cutoff: second_cutoff,
        ..row(1, 10.0, 10.0)
    });
    let table = performance_metrics(&CrossValidationResult { rows }, 0.0).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table[0].horizon, Duration::days(1));
    assert_eq!(table[0].mae, 1.0);
    assert_eq!(table[1].mae, 4.0);
}

#[test]
fn test_horizon_and_summary_values_agree() {
    let table = performance_metrics(&simple_result(), -1.0).unwrap();
    let first = &table[0];
    let scores = first.scores();

    for metric in Metric::ALL {
        assert_eq!(first.value(metric), scores.value(metric));
    }
    assert_eq!(first.value(Metric::Mse), Some(first.mse));
    assert_eq!(first.value(Metric::Coverage), Some(first.coverage));
    assert_eq!(first.value(Metric::Mdape), first.mdape);
}
