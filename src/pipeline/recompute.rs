use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::ForecastUnavailable;
use crate::pipeline::aggregate::{aggregate, new_sessions_by_state, play_metrics};
use crate::pipeline::filter::filter;
use crate::pipeline::forecast::{forecast, forecast_bounded};
use crate::pipeline::merge::merge;
use crate::pipeline::types::{
    ChartPayload, ChartPoint, ForecastOutcome, ForecastStatus, SeriesPoint, SessionRecord,
    TimeRange,
};
use crate::stats::SummaryStats;
use chrono::DateTime;

/// Current filter controls.
#[derive(Debug, Clone)]
pub struct Selection {
    pub assets: BTreeSet<String>,
    pub devices: BTreeSet<String>,
    pub range: TimeRange,
}

/// Runs filter → aggregate → forecast → merge for one interaction.
///
/// Never fails: an unavailable forecast degrades to a historical-only chart.
#[tracing::instrument(skip_all, fields(assets = selection.assets.len(), devices = selection.devices.len()))]
pub fn recompute(dataset: &Dataset, selection: &Selection, config: &PipelineConfig) -> ChartPayload {
    let subset = filter(
        dataset.records(),
        &selection.assets,
        &selection.devices,
        selection.range,
    );
    let origin = dataset.min_ts();
    let historical = aggregate(&subset, config.metric, origin, config.bucket_width);
    let outcome = forecast(&historical, config.bucket_width, &config.forecast);

    assemble(&subset, &historical, outcome, selection, origin, config)
}

/// Same as [`recompute`], but the model fit runs on the blocking pool and
/// is abandoned after `config.forecast.timeout`.
#[tracing::instrument(skip_all, fields(assets = selection.assets.len(), devices = selection.devices.len()))]
pub async fn recompute_bounded(
    dataset: &Dataset,
    selection: &Selection,
    config: &PipelineConfig,
) -> ChartPayload {
    let subset = filter(
        dataset.records(),
        &selection.assets,
        &selection.devices,
        selection.range,
    );
    let origin = dataset.min_ts();
    let historical = aggregate(&subset, config.metric, origin, config.bucket_width);
    let outcome = forecast_bounded(
        historical.clone(),
        config.bucket_width,
        config.forecast.clone(),
    )
    .await;

    assemble(&subset, &historical, outcome, selection, origin, config)
}

fn assemble(
    subset: &[&SessionRecord],
    historical: &[SeriesPoint],
    outcome: Result<ForecastOutcome, ForecastUnavailable>,
    selection: &Selection,
    origin: i64,
    config: &PipelineConfig,
) -> ChartPayload {
    let (forecast_points, status) = match outcome {
        Ok(outcome) => {
            let status = ForecastStatus {
                available: true,
                path: Some(outcome.path),
                season_period: outcome.season_period,
                reason: None,
            };
            (Some(outcome.points), status)
        }
        Err(e) => {
            warn!(error = %e, "Forecast unavailable, rendering history only");
            let status = ForecastStatus {
                available: false,
                path: None,
                season_period: None,
                reason: Some(e.to_string()),
            };
            (None, status)
        }
    };

    let merged = merge(
        historical,
        forecast_points.as_deref(),
        selection.range,
        config.bucket_width,
    );

    info!(
        records = subset.len(),
        buckets = historical.len(),
        merged = merged.len(),
        forecast = status.available,
        "Recompute finished"
    );

    ChartPayload {
        metric: config.metric,
        selection: selection.range,
        records_matched: subset.len(),
        series: merged
            .into_iter()
            .map(|p| ChartPoint {
                ts: DateTime::from_timestamp_nanos(p.bucket),
                value: p.value,
                class: p.class,
            })
            .collect(),
        forecast: status,
        play_metrics: play_metrics(subset),
        new_sessions_by_state: new_sessions_by_state(subset),
        summary: SummaryStats::from_subset(subset, origin, config.bucket_width),
    }
}
