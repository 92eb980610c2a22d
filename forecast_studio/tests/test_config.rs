use forecast_studio::config::{SeasonalityToggle, MAX_PARAMETER};
use forecast_studio::{ForecastError, ForecastParameters, PipelineConfig};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = PipelineConfig::default();
    assert_eq!(config.delimiter, ';');
    assert_eq!(config.interval_width, 0.80);
    assert_eq!(config.uncertainty_samples, 1000);
    assert_eq!(config.rolling_window, 0.1);
    assert_eq!(config.weekly_seasonality, SeasonalityToggle::Auto);
    assert!(config.validate().is_ok());

    let parameters = ForecastParameters::default();
    assert_eq!(parameters.cv_initial_days(), 30);
    assert_eq!(parameters.cv_horizon_days(), 365);
    assert_eq!(parameters.cv_period_days(), 182);
}

#[test]
fn test_partial_json_takes_defaults() {
    let config =
        PipelineConfig::from_json(r#"{"delimiter": ",", "yearly_seasonality": "disabled"}"#).unwrap();
    assert_eq!(config.delimiter, ',');
    assert_eq!(config.yearly_seasonality, SeasonalityToggle::Disabled);
    assert_eq!(config.n_changepoints, 25);
    assert_eq!(config.delimiter_byte().unwrap(), b',');
}

#[test]
fn test_from_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"interval_width": 0.95, "seed": 7}}"#).unwrap();

    let config = PipelineConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.interval_width, 0.95);
    assert_eq!(config.seed, 7);
}

#[rstest]
#[case(r#"{"interval_width": 1.2}"#)]
#[case(r#"{"interval_width": 0.0}"#)]
#[case(r#"{"changepoint_range": 0.0}"#)]
#[case(r#"{"changepoint_prior_scale": -1.0}"#)]
#[case(r#"{"delimiter": "x"}"#)]
fn test_invalid_config(#[case] json: &str) {
    assert!(matches!(
        PipelineConfig::from_json(json),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_malformed_json() {
    assert!(matches!(
        PipelineConfig::from_json("{not json"),
        Err(ForecastError::JsonError(_))
    ));
}

#[rstest]
#[case(0, 30, 365, 182)]
#[case(366, 30, 365, 182)]
#[case(7, 0, 365, 182)]
#[case(7, 30, 400, 182)]
#[case(7, 30, 365, 0)]
fn test_parameters_out_of_range(
    #[case] horizon: u32,
    #[case] initial: u32,
    #[case] cv_horizon: u32,
    #[case] period: u32,
) {
    assert!(matches!(
        ForecastParameters::new(horizon, initial, cv_horizon, period),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_parameters_bounds_are_inclusive() {
    let parameters = ForecastParameters::new(1, MAX_PARAMETER, 1, MAX_PARAMETER).unwrap();
    assert_eq!(parameters.horizon_periods(), 1);

    let window = parameters.cross_validation_window();
    assert_eq!(window.initial_days, 365);
    assert_eq!(window.horizon_days, 1);
    assert_eq!(window.period_days, 365);

    let with_defaults = ForecastParameters::with_horizon(14, 30).unwrap();
    assert_eq!(with_defaults.cv_horizon_days(), 365);
}
