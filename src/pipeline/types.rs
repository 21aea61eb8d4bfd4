//! Data types used by the filter → aggregate → forecast → merge pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stats::SummaryStats;

pub const NANOS_PER_MINUTE: i64 = 60_000_000_000;

/// One session-attempt event from the snapshot, with its timestamp already
/// anchored to the load instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub asset: String,
    pub device: String,
    /// Epoch nanoseconds.
    pub ts: i64,
    pub state: String,
    pub concurrent_plays: u32,
    /// Minutes.
    pub session_length: f64,
    /// Percent.
    pub rbr: f64,
    pub is_vsf: f64,
    pub is_ebvs: f64,
    pub just_joined: u8,
}

impl SessionRecord {
    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.ts)
    }
}

/// Start instant of the fixed-width bucket containing `ts`, on the grid
/// `origin + k * width`.
///
/// The chart maps bar `i` to `origin + i * width`, so `origin` is the
/// dataset's earliest timestamp.
pub fn bucket_of(ts: i64, origin: i64, width: i64) -> i64 {
    origin + (ts - origin).div_euclid(width) * width
}

/// Time window in epoch nanoseconds.
///
/// The row filter treats both bounds as exclusive (`start < ts < end`); the
/// merger treats them as `start <= bucket <= end` when classifying buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Default slider position: the whole dataset, padded by one nanosecond
    /// so the newest record survives the strict upper bound.
    pub fn full(min_ts: i64, max_ts: i64) -> Self {
        Self::new(min_ts, max_ts + 1)
    }

    /// Maps bucket indices selected on the chart back to a time window
    /// (`index * width + min_ts`). No selection, or an index whose instant
    /// does not fit in an `i64`, restores the full range.
    pub fn from_selection(indices: Option<&[usize]>, min_ts: i64, max_ts: i64, width: i64) -> Self {
        let Some(indices) = indices.filter(|i| !i.is_empty()) else {
            return Self::full(min_ts, max_ts);
        };

        let instant = |index: usize| {
            i64::try_from(index)
                .ok()?
                .checked_mul(width)?
                .checked_add(min_ts)
        };
        let lo = indices.iter().copied().min().and_then(instant);
        let hi = indices.iter().copied().max().and_then(instant);

        match (lo, hi) {
            (Some(start), Some(end)) => Self::new(start, end),
            _ => Self::full(min_ts, max_ts),
        }
    }

    /// Strict containment used by the row filter.
    pub fn contains_strict(&self, ts: i64) -> bool {
        self.start < ts && ts < self.end
    }

    /// Bucket membership used for the selected/unselected classification.
    pub fn covers_bucket(&self, bucket: i64) -> bool {
        bucket >= self.start && bucket <= self.end
    }
}

/// Record attribute that can be summed per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    JustJoined,
    ConcurrentPlays,
    SessionLength,
    Rbr,
    IsVsf,
    IsEbvs,
}

impl Metric {
    pub fn value(self, record: &SessionRecord) -> f64 {
        match self {
            Metric::JustJoined => record.just_joined as f64,
            Metric::ConcurrentPlays => record.concurrent_plays as f64,
            Metric::SessionLength => record.session_length,
            Metric::Rbr => record.rbr,
            Metric::IsVsf => record.is_vsf,
            Metric::IsEbvs => record.is_ebvs,
        }
    }
}

/// One bucket of an aggregated or forecast series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub bucket: i64,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(bucket: i64, value: f64) -> Self {
        Self { bucket, value }
    }
}

/// Chart region a merged bucket belongs to. Rendering colors are up to the
/// consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketClass {
    Selected,
    Unselected,
    Forecast,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MergedPoint {
    pub bucket: i64,
    pub value: f64,
    pub class: BucketClass,
}

/// Which autoregressive parameterization produced the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorPath {
    Primary,
    Relaxed,
}

/// A blended forecast and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOutcome {
    pub points: Vec<SeriesPoint>,
    pub path: EstimatorPath,
    pub season_period: Option<usize>,
}

/// Chart-facing point with a wall-clock timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub ts: DateTime<Utc>,
    pub value: f64,
    pub class: BucketClass,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimedValue {
    pub ts: DateTime<Utc>,
    pub value: f64,
}

/// Per-record rebuffering and failure series for the play-metrics chart.
#[derive(Debug, Default, Serialize)]
pub struct PlayMetrics {
    pub rbr: Vec<TimedValue>,
    pub vsf: Vec<TimedValue>,
    pub ebvs: Vec<TimedValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSessions {
    pub code: String,
    pub name: Option<&'static str>,
    pub sessions: f64,
}

#[derive(Debug, Serialize)]
pub struct ForecastStatus {
    pub available: bool,
    pub path: Option<EstimatorPath>,
    pub season_period: Option<usize>,
    pub reason: Option<String>,
}

/// Everything one recompute hands back to the presentation layer.
#[derive(Debug, Serialize)]
pub struct ChartPayload {
    pub metric: Metric,
    pub selection: TimeRange,
    pub records_matched: usize,
    pub series: Vec<ChartPoint>,
    pub forecast: ForecastStatus,
    pub play_metrics: PlayMetrics,
    pub new_sessions_by_state: Vec<StateSessions>,
    pub summary: SummaryStats,
}
