use forecast_studio::metrics::performance_metrics;
use forecast_studio::{DataLoader, ForecastParameters, ForecastService, PipelineConfig};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Forecast Studio: Basic Forecasting Example");
    println!("==========================================\n");

    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("examples/csv/daily_visits.csv");
    let config = PipelineConfig::default();
    let data = DataLoader::from_path(&path, config.delimiter_byte()?)?;
    println!("{}", data.describe());

    // Fit once and keep the handle for every later stage
    let service = ForecastService::from_config(&config)?;
    let fitted = service.fit(&data)?;
    println!("Inferred frequency: {}\n", fitted.frequency());

    // A year of data is too short for the default 30 + 365 day window
    let parameters = ForecastParameters::new(14, 180, 30, 30)?;
    let cv = service.cross_validate(&fitted, &parameters.cross_validation_window())?;
    println!("Cross-validation: {} predictions over {} cutoffs", cv.len(), cv.cutoffs().len());

    let table = performance_metrics(&cv, config.rolling_window)?;
    println!("\nRolling MAE by horizon (every 5th):");
    for row in table.iter().step_by(5) {
        println!("  {:>5.1} days: {:.3}", row.horizon_days(), row.mae);
    }

    let summary = forecast_studio::metrics::summarize(&cv)?;
    println!("\n{}", summary);

    let predictions = service.predict(&fitted, parameters.horizon_periods())?;
    let future = forecast_studio::export::filter_future(&predictions, fitted.max_observed());
    println!("Next {} days:", future.len());
    for row in future.rows() {
        println!(
            "  {}: {:.2} ({:.2} .. {:.2})",
            row.timestamp.date(),
            row.yhat,
            row.yhat_lower,
            row.yhat_upper
        );
    }

    Ok(())
}
