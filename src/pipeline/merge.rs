use std::collections::HashMap;

use crate::pipeline::types::{BucketClass, MergedPoint, SeriesPoint, TimeRange};

/// Joins the historical and forecast series into one dense, chronological
/// series and classifies every bucket.
///
/// The output covers every bucket from the first historical bucket through
/// the last forecast bucket (or the last historical bucket when there is no
/// forecast). Historical gaps are filled with zero; forecast values are taken
/// verbatim. An empty history yields an empty series.
pub fn merge(
    historical: &[SeriesPoint],
    forecast: Option<&[SeriesPoint]>,
    selected: TimeRange,
    width: i64,
) -> Vec<MergedPoint> {
    let (Some(first), Some(last_historical)) = (historical.first(), historical.last()) else {
        return Vec::new();
    };

    let forecast = forecast.unwrap_or_default();
    let end = forecast
        .last()
        .map_or(last_historical.bucket, |p| p.bucket.max(last_historical.bucket));

    let values: HashMap<i64, f64> = historical
        .iter()
        .chain(forecast)
        .map(|p| (p.bucket, p.value))
        .collect();

    let mut merged = Vec::with_capacity(((end - first.bucket) / width + 1) as usize);
    let mut bucket = first.bucket;
    while bucket <= end {
        merged.push(MergedPoint {
            bucket,
            value: values.get(&bucket).copied().unwrap_or(0.0),
            class: classify(bucket, last_historical.bucket, selected),
        });
        bucket += width;
    }

    merged
}

fn classify(bucket: i64, last_historical: i64, selected: TimeRange) -> BucketClass {
    if bucket > last_historical {
        BucketClass::Forecast
    } else if selected.covers_bucket(bucket) {
        BucketClass::Selected
    } else {
        BucketClass::Unselected
    }
}
