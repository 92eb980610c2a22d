use chrono::{NaiveDate, NaiveDateTime};
use forecast_studio::data::{DataLoader, TimeSeriesData, TimeSeriesRow};
use forecast_studio::ForecastError;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn test_load_semicolon_table() {
    let csv = "ds;y\n2020-01-01;10.5\n2020-01-02;11\n2020-01-03;12.25\n";
    let data = DataLoader::load(csv.as_bytes(), b';').unwrap();

    assert_eq!(data.len(), 3);
    assert_eq!(
        data.rows()[0],
        TimeSeriesRow {
            timestamp: Some(date(2020, 1, 1)),
            value: Some(10.5)
        }
    );
    assert_eq!(data.max_timestamp(), Some(date(2020, 1, 3)));
    assert_eq!(data.observations().len(), 3);
}

#[test]
fn test_invalid_timestamp_becomes_missing() {
    let csv = "ds;y\n2020-01-01;1\nnot-a-date;2\n2020-01-03;3\n";
    let data = DataLoader::load(csv.as_bytes(), b';').unwrap();

    assert_eq!(data.len(), 3);
    assert_eq!(data.rows()[1].timestamp, None);
    assert_eq!(data.rows()[1].value, Some(2.0));
    assert_eq!(data.missing_timestamps(), 1);
    assert_eq!(data.observations().len(), 2);
}

#[test]
fn test_extra_columns_and_padded_header() {
    let csv = "region; ds ; y \nnorth;2021-06-01 08:00:00;4\nsouth;2021-06-01 09:00:00;5\n";
    let data = DataLoader::load(csv.as_bytes(), b';').unwrap();

    let expected = date(2021, 6, 1).date().and_hms_opt(9, 0, 0).unwrap();
    assert_eq!(data.max_timestamp(), Some(expected));
    assert_eq!(data.values(), vec![4.0, 5.0]);
}

#[test]
fn test_blank_value_is_missing() {
    let csv = "ds;y\n2020-01-01;1\n2020-01-02;\n2020-01-03;3\n";
    let data = DataLoader::load(csv.as_bytes(), b';').unwrap();

    assert_eq!(data.rows()[1].value, None);
    assert_eq!(data.observations().len(), 2);
}

#[test]
fn test_wrong_delimiter_is_ingestion_error() {
    let csv = "ds,y\n2020-01-01,1\n2020-01-02,2\n";
    let result = DataLoader::load(csv.as_bytes(), b';');

    match result {
        Err(ForecastError::IngestionError(message)) => {
            assert!(message.contains("';'"), "message was: {}", message)
        }
        other => panic!("expected an ingestion error, got {:?}", other),
    }
}

#[test]
fn test_empty_and_missing_columns() {
    assert!(matches!(
        DataLoader::load(b"", b';'),
        Err(ForecastError::IngestionError(_))
    ));
    assert!(matches!(
        DataLoader::load(b"ds;value\n2020-01-01;1\n", b';'),
        Err(ForecastError::IngestionError(_))
    ));
}

#[test]
fn test_from_path() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ds;y").unwrap();
    writeln!(file, "2023-01-01;100.0").unwrap();
    writeln!(file, "2023-01-02;102.0").unwrap();

    let data = DataLoader::from_path(file.path(), b';').unwrap();
    assert_eq!(data.len(), 2);

    let missing = DataLoader::from_path("/nonexistent/path.csv", b';');
    assert!(matches!(missing, Err(ForecastError::IoError(_))));
}

#[test]
fn test_describe() {
    let dates = (1..=5).map(|d| date(2020, 1, d)).collect();
    let data = TimeSeriesData::new(dates, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    let summary = data.describe();

    assert_eq!(summary.count, 5);
    assert_eq!(summary.missing_timestamps, 0);
    assert_eq!(summary.first_timestamp, Some(date(2020, 1, 1)));
    assert_eq!(summary.mean, Some(3.0));
    assert_eq!(summary.median, Some(3.0));
    assert_eq!(summary.q25, Some(2.0));
    assert_eq!(summary.max, Some(5.0));
    approx::assert_relative_eq!(summary.std.unwrap(), 2.5f64.sqrt(), epsilon = 1e-12);

    let text = summary.to_string();
    assert!(text.contains("Data Summary"));
}

#[test]
fn test_new_rejects_mismatched_lengths() {
    let result = TimeSeriesData::new(vec![date(2020, 1, 1)], vec![1.0, 2.0]);
    assert!(result.is_err());
}
