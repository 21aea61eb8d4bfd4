use crate::pipeline::types::{
    Metric, PlayMetrics, SeriesPoint, SessionRecord, StateSessions, TimedValue, bucket_of,
};
use crate::presets::state_name;
use std::collections::BTreeMap;

/// Sums `metric` over the subset per fixed-width bucket, with bucket starts
/// on the grid `origin + k * width`.
///
/// The result is ascending by bucket start and sparse: buckets without any
/// contributing record are not emitted.
pub fn aggregate(
    subset: &[&SessionRecord],
    metric: Metric,
    origin: i64,
    width: i64,
) -> Vec<SeriesPoint> {
    let mut buckets: BTreeMap<i64, f64> = BTreeMap::new();

    for record in subset {
        *buckets.entry(bucket_of(record.ts, origin, width)).or_default() += metric.value(record);
    }

    buckets
        .into_iter()
        .map(|(bucket, value)| SeriesPoint::new(bucket, value))
        .collect()
}

/// Sums `just_joined` per state code for the new-sessions map.
pub fn new_sessions_by_state(subset: &[&SessionRecord]) -> Vec<StateSessions> {
    let mut by_state: BTreeMap<&str, f64> = BTreeMap::new();

    for record in subset {
        *by_state.entry(record.state.as_str()).or_default() += record.just_joined as f64;
    }

    by_state
        .into_iter()
        .map(|(code, sessions)| StateSessions {
            code: code.to_string(),
            name: state_name(code),
            sessions,
        })
        .collect()
}

/// Per-record rebuffering ratio and failure flags, ordered by timestamp.
pub fn play_metrics(subset: &[&SessionRecord]) -> PlayMetrics {
    let mut ordered: Vec<&SessionRecord> = subset.to_vec();
    ordered.sort_by_key(|r| r.ts);

    let mut metrics = PlayMetrics::default();
    for record in ordered {
        let ts = record.timestamp();
        metrics.rbr.push(TimedValue { ts, value: record.rbr });
        metrics.vsf.push(TimedValue { ts, value: record.is_vsf });
        metrics.ebvs.push(TimedValue { ts, value: record.is_ebvs });
    }

    metrics
}
