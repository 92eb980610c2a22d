//! A user session: uploaded data, the model service and the current fit

use crate::charts::{
    component_charts, render_cross_validation_chart, render_forecast_chart, render_series_chart,
    ChartSpec, RenderedChart, CROSS_VALIDATION_CHART_METRICS,
};
use crate::config::{ForecastParameters, PipelineConfig};
use crate::cross_validation::CrossValidationResult;
use crate::data::{DataLoader, DataSummary, TimeSeriesData};
use crate::error::{ForecastError, Result};
use crate::export::{filter_future, DownloadArtifact, FilteredForecast};
use crate::metrics::{performance_metrics, summarize_table, AccuracyMetrics, HorizonMetrics, Metric};
use crate::models::{AdditiveModel, ForecastModel};
use crate::service::{FittedModel, ForecastService};
use tracing::{info, warn};

/// Everything a pipeline run produces, in the order it was produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub parameters: ForecastParameters,
    pub series_chart: RenderedChart,
    pub cross_validation: CrossValidationResult,
    pub performance: Vec<HorizonMetrics>,
    pub accuracy: AccuracyMetrics,
    pub cross_validation_charts: Vec<(Metric, RenderedChart)>,
    pub forecast: FilteredForecast,
    pub forecast_chart: RenderedChart,
    pub component_charts: Vec<ChartSpec>,
    pub artifact: DownloadArtifact,
}

impl PipelineReport {
    /// Charts that had to fall back to a placeholder or simpler view
    pub fn degraded_charts(&self) -> usize {
        std::iter::once(&self.series_chart)
            .chain(self.cross_validation_charts.iter().map(|(_, chart)| chart))
            .chain(std::iter::once(&self.forecast_chart))
            .filter(|chart| chart.degraded)
            .count()
    }
}

/// Per-user context; nothing is shared between sessions
#[derive(Debug)]
pub struct ForecastSession<M: ForecastModel = AdditiveModel> {
    data: TimeSeriesData,
    service: ForecastService<M>,
    rolling_window: f64,
    fitted: Option<FittedModel<M::Fitted>>,
}

impl ForecastSession<AdditiveModel> {
    /// Parse an upload and set up the additive model from `config`
    pub fn from_csv_bytes(bytes: &[u8], config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let data = DataLoader::load(bytes, config.delimiter_byte()?)?;
        Ok(Self::new(data, ForecastService::from_config(config)?, config))
    }
}

impl<M: ForecastModel> ForecastSession<M> {
    pub fn new(data: TimeSeriesData, service: ForecastService<M>, config: &PipelineConfig) -> Self {
        Self {
            data,
            service,
            rolling_window: config.rolling_window,
            fitted: None,
        }
    }

    pub fn data(&self) -> &TimeSeriesData {
        &self.data
    }

    /// Descriptive statistics of the uploaded data
    pub fn summary(&self) -> DataSummary {
        self.data.describe()
    }

    /// The model from the latest successful fit
    pub fn fitted_model(&self) -> Option<&FittedModel<M::Fitted>> {
        self.fitted.as_ref()
    }

    /// Swap in a new upload; the previous fit no longer applies
    pub fn replace_data(&mut self, data: TimeSeriesData) {
        self.data = data;
        self.fitted = None;
    }

    /// Fit on the session data, replacing any previous model
    pub fn fit(&mut self) -> Result<&FittedModel<M::Fitted>> {
        self.fitted = None;
        let fitted = self.service.fit(&self.data)?;
        Ok(self.fitted.insert(fitted))
    }

    /// Run the whole pipeline with `parameters`.
    ///
    /// Stages run one after another and each receives the previous
    /// stage's output. Ingestion, fitting and validation failures end the
    /// run; charts that cannot be drawn are replaced by fallbacks.
    pub fn run(&mut self, parameters: &ForecastParameters) -> Result<PipelineReport> {
        info!(?parameters, rows = self.data.len(), "starting pipeline run");

        let series_chart = render_series_chart(&self.data)?;

        self.fitted = None;
        let fitted: &FittedModel<M::Fitted> = self.fitted.insert(self.service.fit(&self.data)?);

        let window = parameters.cross_validation_window();
        let cross_validation = self.service.cross_validate(fitted, &window)?;
        let performance = performance_metrics(&cross_validation, self.rolling_window)?;
        let accuracy = summarize_table(&performance);
        info!(
            mse = accuracy.mse,
            mae = accuracy.mae,
            mape = ?accuracy.mape,
            mdape = ?accuracy.mdape,
            "cross-validation summary"
        );

        let cross_validation_charts = CROSS_VALIDATION_CHART_METRICS
            .iter()
            .map(|&metric| {
                render_cross_validation_chart(&cross_validation, metric, self.rolling_window)
                    .map(|chart| (metric, chart))
            })
            .collect::<Result<Vec<_>>>()?;

        let predictions = self.service.predict(fitted, parameters.horizon_periods())?;
        let forecast = filter_future(&predictions, fitted.max_observed());

        let forecast_chart = render_forecast_chart(&self.data, &predictions)?;
        let component_charts = match component_charts(fitted, &predictions) {
            Ok(charts) => charts,
            Err(ForecastError::ChartRenderError(message)) => {
                warn!(%message, "component charts skipped");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let artifact = DownloadArtifact::from_forecast(&forecast)?;
        info!(
            future_rows = forecast.len(),
            bytes = artifact.bytes.len(),
            "pipeline run finished"
        );

        Ok(PipelineReport {
            parameters: *parameters,
            series_chart,
            cross_validation,
            performance,
            accuracy,
            cross_validation_charts,
            forecast,
            forecast_chart,
            component_charts,
            artifact,
        })
    }
}
