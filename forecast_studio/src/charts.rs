//! Chart specifications for the pipeline outputs
//!
//! Charts are plain data: a title, two axes and a stack of layers, each a
//! line, a set of points or a shaded band. They serialize to JSON so any
//! front-end can draw them. Builders fail with `ChartRenderError` when the
//! data cannot be drawn; the `render_*` functions turn that error into a
//! fallback chart marked as degraded.

use crate::cross_validation::CrossValidationResult;
use crate::data::TimeSeriesData;
use crate::error::{ForecastError, Result};
use crate::metrics::{performance_metrics, Metric};
use crate::models::{FittedForecastModel, ForecastRow};
use crate::service::FittedModel;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::warn;

/// Metrics charted after cross-validation, in display order
pub const CROSS_VALIDATION_CHART_METRICS: [Metric; 4] =
    [Metric::Mape, Metric::Mse, Metric::Mae, Metric::Mdape];

/// Horizontal position of a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum XValue {
    Temporal(NaiveDateTime),
    Numeric(f64),
}

/// One plotted point; bands use `y` as the lower and `y2` as the upper edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: XValue,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
}

impl ChartPoint {
    fn at(x: XValue, y: f64) -> Self {
        Self { x, y, y2: None }
    }
}

/// How a layer is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Line,
    Point,
    Band,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub label: String,
    pub mark: Mark,
    pub points: Vec<ChartPoint>,
}

impl Layer {
    fn new(label: &str, mark: Mark, points: Vec<ChartPoint>) -> Self {
        Self {
            label: label.to_string(),
            mark,
            points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    Temporal,
    Quantitative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    pub kind: AxisKind,
}

impl Axis {
    fn temporal(title: &str) -> Self {
        Self {
            title: title.to_string(),
            kind: AxisKind::Temporal,
        }
    }

    fn quantitative(title: &str) -> Self {
        Self {
            title: title.to_string(),
            kind: AxisKind::Quantitative,
        }
    }
}

/// A complete chart description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    pub layers: Vec<Layer>,
    /// Message shown instead of, or next to, the layers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ChartSpec {
    /// An empty chart carrying only an explanation
    pub fn placeholder(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            x: Axis::quantitative(""),
            y: Axis::quantitative(""),
            layers: Vec::new(),
            note: Some(message.to_string()),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A chart as shown to the user, flagged when a fallback was used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedChart {
    pub spec: ChartSpec,
    pub degraded: bool,
}

/// Use `fallback` in place of a chart that failed to render.
///
/// Only `ChartRenderError` is absorbed; any other error is returned.
pub fn render_or_else(
    built: Result<ChartSpec>,
    fallback: impl FnOnce(&str) -> ChartSpec,
) -> Result<RenderedChart> {
    match built {
        Ok(spec) => Ok(RenderedChart {
            spec,
            degraded: false,
        }),
        Err(ForecastError::ChartRenderError(message)) => {
            warn!(%message, "chart could not be rendered, using fallback");
            Ok(RenderedChart {
                spec: fallback(&message),
                degraded: true,
            })
        }
        Err(e) => Err(e),
    }
}

/// Line of `y` over `ds` for rows where both are present
pub fn series_chart(data: &TimeSeriesData) -> Result<ChartSpec> {
    let mut observations = data.observations();
    if observations.is_empty() {
        return Err(ForecastError::ChartRenderError(
            "No row has both a valid timestamp and a value".to_string(),
        ));
    }
    observations.sort_by_key(|obs| obs.timestamp);

    let points = observations
        .iter()
        .map(|obs| ChartPoint::at(XValue::Temporal(obs.timestamp), obs.value))
        .collect();
    Ok(ChartSpec {
        title: "Time series".to_string(),
        x: Axis::temporal("ds"),
        y: Axis::quantitative("y"),
        layers: vec![Layer::new("y", Mark::Line, points)],
        note: None,
    })
}

/// Line of `y` over the row number, ignoring timestamps
pub fn index_chart(data: &TimeSeriesData) -> ChartSpec {
    let points = data
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(i, row)| row.value.map(|v| ChartPoint::at(XValue::Numeric(i as f64), v)))
        .collect();
    ChartSpec {
        title: "Time series (by row)".to_string(),
        x: Axis::quantitative("row"),
        y: Axis::quantitative("y"),
        layers: vec![Layer::new("y", Mark::Line, points)],
        note: Some("Timestamps could not be used; values are plotted by row".to_string()),
    }
}

/// Series chart, falling back to the row-number chart
pub fn render_series_chart(data: &TimeSeriesData) -> Result<RenderedChart> {
    render_or_else(series_chart(data), |_| index_chart(data))
}

/// Error of every cross-validation record against its horizon, with the
/// rolling metric drawn on top
pub fn cross_validation_metric_chart(
    cv: &CrossValidationResult,
    metric: Metric,
    rolling_window: f64,
) -> Result<ChartSpec> {
    if cv.is_empty() {
        return Err(ForecastError::ChartRenderError(
            "Cross-validation produced no records to plot".to_string(),
        ));
    }
    let undefined = || {
        ForecastError::ChartRenderError(format!(
            "{} is undefined because some actual values are zero",
            metric.name().to_uppercase()
        ))
    };

    let records = cv
        .rows
        .iter()
        .map(|row| {
            let days = row.horizon().num_seconds() as f64 / 86_400.0;
            metric
                .pointwise(row)
                .map(|v| ChartPoint::at(XValue::Numeric(days), v))
                .ok_or_else(undefined)
        })
        .collect::<Result<Vec<_>>>()?;

    let rolling = performance_metrics(cv, rolling_window)?
        .iter()
        .map(|m| {
            m.value(metric)
                .map(|v| ChartPoint::at(XValue::Numeric(m.horizon_days()), v))
                .ok_or_else(undefined)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ChartSpec {
        title: format!("Cross-validation {}", metric.name().to_uppercase()),
        x: Axis::quantitative("Horizon (days)"),
        y: Axis::quantitative(metric.name()),
        layers: vec![
            Layer::new("record", Mark::Point, records),
            Layer::new(metric.name(), Mark::Line, rolling),
        ],
        note: None,
    })
}

/// Metric chart, replaced by a placeholder naming the problem
pub fn render_cross_validation_chart(
    cv: &CrossValidationResult,
    metric: Metric,
    rolling_window: f64,
) -> Result<RenderedChart> {
    let title = format!("Cross-validation {}", metric.name().to_uppercase());
    render_or_else(
        cross_validation_metric_chart(cv, metric, rolling_window),
        |message| ChartSpec::placeholder(&title, message),
    )
}

/// Observed points, predicted line and uncertainty band
pub fn forecast_chart(data: &TimeSeriesData, forecast: &[ForecastRow]) -> Result<ChartSpec> {
    if forecast.is_empty() {
        return Err(ForecastError::ChartRenderError(
            "No forecast rows to plot".to_string(),
        ));
    }

    let band = forecast
        .iter()
        .map(|row| ChartPoint {
            x: XValue::Temporal(row.timestamp),
            y: row.yhat_lower,
            y2: Some(row.yhat_upper),
        })
        .collect();
    let line = forecast
        .iter()
        .map(|row| ChartPoint::at(XValue::Temporal(row.timestamp), row.yhat))
        .collect();
    let actual = data
        .observations()
        .iter()
        .map(|obs| ChartPoint::at(XValue::Temporal(obs.timestamp), obs.value))
        .collect();

    Ok(ChartSpec {
        title: "Forecast".to_string(),
        x: Axis::temporal("ds"),
        y: Axis::quantitative("y"),
        layers: vec![
            Layer::new("interval", Mark::Band, band),
            Layer::new("yhat", Mark::Line, line),
            Layer::new("actual", Mark::Point, actual),
        ],
        note: None,
    })
}

/// Forecast overlay, replaced by a placeholder naming the problem
pub fn render_forecast_chart(data: &TimeSeriesData, forecast: &[ForecastRow]) -> Result<RenderedChart> {
    render_or_else(forecast_chart(data, forecast), |message| {
        ChartSpec::placeholder("Forecast", message)
    })
}

fn reference_day() -> Result<NaiveDateTime> {
    // 2017-01-01 is a Sunday
    NaiveDate::from_ymd_opt(2017, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ForecastError::ChartRenderError("Invalid reference date".to_string()))
}

/// Trend over the forecast range plus one chart per active seasonality
/// (weekly from Sunday, yearly from January 1st, daily from midnight)
pub fn component_charts<F: FittedForecastModel>(
    fitted: &FittedModel<F>,
    forecast: &[ForecastRow],
) -> Result<Vec<ChartSpec>> {
    if forecast.is_empty() {
        return Err(ForecastError::ChartRenderError(
            "No forecast rows to decompose".to_string(),
        ));
    }
    let model = fitted.model();

    let timestamps: Vec<NaiveDateTime> = forecast.iter().map(|row| row.timestamp).collect();
    let components = model.components(&timestamps)?;
    let trend = components
        .timestamps
        .iter()
        .zip(&components.trend)
        .map(|(ts, v)| ChartPoint::at(XValue::Temporal(*ts), *v))
        .collect();
    let mut charts = vec![ChartSpec {
        title: "Trend".to_string(),
        x: Axis::temporal("ds"),
        y: Axis::quantitative("trend"),
        layers: vec![Layer::new("trend", Mark::Line, trend)],
        note: None,
    }];

    let start = reference_day()?;
    let profiles: [(&str, &str, Duration, usize); 3] = [
        ("weekly", "Day of week", Duration::days(1), 7),
        ("yearly", "Day of year", Duration::days(1), 365),
        ("daily", "Hour of day", Duration::minutes(10), 144),
    ];
    for (name, x_title, step, count) in profiles {
        let grid: Vec<NaiveDateTime> = (0..count).map(|i| start + step * i as i32).collect();
        let components = model.components(&grid)?;
        let Some(values) = components.seasonal(name) else {
            continue;
        };

        let points = grid
            .iter()
            .zip(values)
            .map(|(ts, v)| ChartPoint::at(XValue::Temporal(*ts), *v))
            .collect();
        charts.push(ChartSpec {
            title: format!("{}{} seasonality", name[..1].to_uppercase(), &name[1..]),
            x: Axis::temporal(x_title),
            y: Axis::quantitative(name),
            layers: vec![Layer::new(name, Mark::Line, points)],
            note: None,
        });
    }

    Ok(charts)
}
