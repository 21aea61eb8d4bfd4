//! Output formatting and persistence for chart payloads.
//!
//! Supports pretty-printing, JSON serialization, and CSV export of the
//! merged series.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use tracing::{debug, info};

use crate::pipeline::types::{BucketClass, ChartPayload};

#[derive(Serialize)]
struct SeriesRow {
    timestamp: DateTime<Utc>,
    value: f64,
    class: BucketClass,
}

/// Logs the payload using Rust's debug pretty-print format.
pub fn print_pretty(payload: &ChartPayload) {
    debug!("{:#?}", payload);
}

/// Logs the summary block as pretty-printed JSON.
pub fn print_summary(payload: &ChartPayload) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(&payload.summary)?);
    Ok(())
}

/// Writes the full payload as pretty JSON to `path`, or stdout for `"-"`.
pub fn write_json(path: &str, payload: &ChartPayload) -> Result<()> {
    let body = serde_json::to_string_pretty(payload)?;

    if path == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(body.as_bytes())?;
        stdout.write_all(b"\n")?;
    } else {
        let mut file = File::create(path)?;
        file.write_all(body.as_bytes())?;
        info!(path, bytes = body.len(), "Payload written");
    }

    Ok(())
}

/// Writes the merged series to a CSV file, replacing any previous export.
pub fn write_series_csv(path: &str, payload: &ChartPayload) -> Result<()> {
    debug!(path, rows = payload.series.len(), "Writing series CSV");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for point in &payload.series {
        writer.serialize(SeriesRow {
            timestamp: point.ts,
            value: point.value,
            class: point.class,
        })?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{
        ChartPoint, ForecastStatus, Metric, PlayMetrics, TimeRange,
    };
    use crate::stats::SummaryStats;
    use std::env;
    use std::fs;
    use std::path::Path;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn payload() -> ChartPayload {
        let series = [
            (0, 3.0, BucketClass::Selected),
            (60_000_000_000, 0.0, BucketClass::Unselected),
            (120_000_000_000, 2.5, BucketClass::Forecast),
        ]
        .into_iter()
        .map(|(ns, value, class)| ChartPoint {
            ts: DateTime::from_timestamp_nanos(ns),
            value,
            class,
        })
        .collect();

        ChartPayload {
            metric: Metric::JustJoined,
            selection: TimeRange::new(0, 60_000_000_000),
            records_matched: 3,
            series,
            forecast: ForecastStatus {
                available: true,
                path: None,
                season_period: None,
                reason: None,
            },
            play_metrics: PlayMetrics::default(),
            new_sessions_by_state: Vec::new(),
            summary: SummaryStats::default(),
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&payload());
    }

    #[test]
    fn test_print_summary_does_not_panic() {
        print_summary(&payload()).unwrap();
    }

    #[test]
    fn test_write_json_roundtrips_classes() {
        let path = temp_path("live_insights_test_payload.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &payload()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["metric"], "just_joined");
        assert_eq!(value["series"][2]["class"], "forecast");
        assert_eq!(value["summary"]["avg_session_time"], "0 mins");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_series_csv() {
        let path = temp_path("live_insights_test_series.csv");
        let _ = fs::remove_file(&path);

        write_series_csv(&path, &payload()).unwrap();
        assert!(Path::new(&path).exists());

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "timestamp,value,class");
        assert!(lines[3].ends_with(",2.5,forecast"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_series_csv_replaces_previous_export() {
        let path = temp_path("live_insights_test_replace.csv");
        let _ = fs::remove_file(&path);

        write_series_csv(&path, &payload()).unwrap();
        write_series_csv(&path, &payload()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.starts_with("timestamp")).count();
        assert_eq!(header_count, 1);

        fs::remove_file(&path).unwrap();
    }
}
