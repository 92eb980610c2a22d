//! # forecast_studio
//!
//! Command-line driver for the forecasting pipeline.

use clap::{Parser, Subcommand};
use forecast_studio::config::{DEFAULT_CV_HORIZON_DAYS, DEFAULT_CV_INITIAL_DAYS};
use forecast_studio::{DataLoader, ForecastParameters, ForecastSession, PipelineConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "forecast_studio")]
#[command(about = "Fit, validate and export time series forecasts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on a `ds`/`y` table
    Forecast {
        /// Input file with `ds` and `y` columns
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Field separator, overriding the configuration
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Number of periods to forecast
        #[arg(short, long)]
        periods: u32,

        /// Days of history before the first cross-validation cutoff
        #[arg(long, default_value_t = DEFAULT_CV_INITIAL_DAYS)]
        cv_initial: u32,

        /// Days scored after each cutoff
        #[arg(long, default_value_t = DEFAULT_CV_HORIZON_DAYS)]
        cv_horizon: u32,

        /// Days between cutoffs (half the horizon when omitted)
        #[arg(long)]
        cv_period: Option<u32>,

        /// Where to write the forecast
        #[arg(short, long, default_value = "forecast_data.csv")]
        output: PathBuf,

        /// Directory for chart JSON files
        #[arg(long)]
        charts_dir: Option<PathBuf>,
    },

    /// Print descriptive statistics of a `ds`/`y` table
    Describe {
        /// Input file with `ds` and `y` columns
        #[arg(short, long)]
        input: PathBuf,

        /// Field separator
        #[arg(short, long, default_value_t = ';')]
        delimiter: char,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forecast_studio=info".into()),
        )
        .init();
}

fn write_chart(dir: &Path, name: &str, spec: &forecast_studio::charts::ChartSpec) -> Result<(), Box<dyn std::error::Error>> {
    let path = dir.join(format!("{}.json", name));
    fs::write(&path, spec.to_json()?)?;
    info!(path = %path.display(), "wrote chart");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Forecast {
            input,
            config,
            delimiter,
            periods,
            cv_initial,
            cv_horizon,
            cv_period,
            output,
            charts_dir,
        } => {
            let mut pipeline_config = match config {
                Some(path) => PipelineConfig::from_json_file(path)?,
                None => PipelineConfig::default(),
            };
            if let Some(delimiter) = delimiter {
                pipeline_config.delimiter = delimiter;
            }

            let cv_period = cv_period.unwrap_or((cv_horizon / 2).max(1));
            let parameters = ForecastParameters::new(periods, cv_initial, cv_horizon, cv_period)?;

            let bytes = fs::read(&input)?;
            let mut session = ForecastSession::from_csv_bytes(&bytes, &pipeline_config)?;
            let report = session.run(&parameters)?;

            println!("{}", report.accuracy);
            println!(
                "Forecast: {} future row(s) written to {}",
                report.forecast.len(),
                output.display()
            );
            fs::write(&output, &report.artifact.bytes)?;

            if let Some(dir) = charts_dir {
                fs::create_dir_all(&dir)?;
                write_chart(&dir, "series", &report.series_chart.spec)?;
                for (metric, chart) in &report.cross_validation_charts {
                    write_chart(&dir, &format!("cross_validation_{}", metric), &chart.spec)?;
                }
                write_chart(&dir, "forecast", &report.forecast_chart.spec)?;
                for (i, chart) in report.component_charts.iter().enumerate() {
                    write_chart(&dir, &format!("component_{}", i), chart)?;
                }
            }

            let degraded = report.degraded_charts();
            if degraded > 0 {
                println!("{} chart(s) were replaced by a fallback", degraded);
            }
        }
        Commands::Describe { input, delimiter } => {
            let config = PipelineConfig {
                delimiter,
                ..PipelineConfig::default()
            };
            let data = DataLoader::from_path(&input, config.delimiter_byte()?)?;
            println!("{}", data.describe());
        }
    }

    Ok(())
}
