use serde::Serialize;
use std::collections::BTreeSet;

use crate::pipeline::aggregate::aggregate;
use crate::pipeline::types::{Metric, SessionRecord};
use crate::pipeline::utility::{mean, round_to};

/// Headline numbers shown above the main chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Largest per-bucket sum of concurrent plays.
    pub max_concurrent_plays: u64,
    /// Mean session length, e.g. `"23.41 mins"`.
    pub avg_session_time: String,
    /// Mean rebuffering ratio, e.g. `"0.57%"`.
    pub avg_rbr: String,
    /// Distinct assets with at least one concurrent play.
    pub live_assets: usize,
}

impl Default for SummaryStats {
    fn default() -> Self {
        Self::from_subset(&[], 0, 1)
    }
}

impl SummaryStats {
    /// Builds the headline numbers; buckets follow the `origin + k * width` grid.
    pub fn from_subset(subset: &[&SessionRecord], origin: i64, width: i64) -> Self {
        let max_concurrent_plays = aggregate(subset, Metric::ConcurrentPlays, origin, width)
            .iter()
            .map(|p| p.value as u64)
            .max()
            .unwrap_or(0);

        let lengths: Vec<f64> = subset.iter().map(|r| r.session_length).collect();
        let rbrs: Vec<f64> = subset.iter().map(|r| r.rbr).collect();

        let live_assets = subset
            .iter()
            .filter(|r| r.concurrent_plays > 0)
            .map(|r| r.asset.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            max_concurrent_plays,
            avg_session_time: format!("{} mins", round_to(mean(&lengths), 2)),
            avg_rbr: format!("{}%", round_to(mean(&rbrs), 2)),
            live_assets,
        }
    }
}

/// Compact rendering of large counts: `1234` → `"1K"`, `2_500_000` → `"2M"`.
pub fn human_format(num: u64) -> String {
    const SUFFIXES: [&str; 6] = ["", "K", "M", "G", "T", "P"];

    let mut magnitude = 0;
    let mut mantissa = num;
    while mantissa >= 1000 && magnitude < SUFFIXES.len() - 1 {
        mantissa /= 1000;
        magnitude += 1;
    }
    format!("{}{}", mantissa, SUFFIXES[magnitude])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::NANOS_PER_MINUTE;

    const W: i64 = NANOS_PER_MINUTE;

    fn record(asset: &str, ts: i64, plays: u32, length: f64, rbr: f64) -> SessionRecord {
        SessionRecord {
            asset: asset.to_string(),
            device: "Browser".to_string(),
            ts,
            state: "WA".to_string(),
            concurrent_plays: plays,
            session_length: length,
            rbr,
            is_vsf: 0.0,
            is_ebvs: 0.0,
            just_joined: 1,
        }
    }

    #[test]
    fn test_summary_from_subset() {
        let records = vec![
            record("a", 0, 3, 10.0, 1.0),
            record("b", 10, 4, 20.0, 2.0),
            record("b", W, 5, 30.0, 0.5),
            record("c", 2 * W, 0, 15.5, 0.0),
        ];
        let subset: Vec<&SessionRecord> = records.iter().collect();

        let stats = SummaryStats::from_subset(&subset, 0, W);
        assert_eq!(stats.max_concurrent_plays, 7);
        assert_eq!(stats.avg_session_time, "18.88 mins");
        assert_eq!(stats.avg_rbr, "0.88%");
        assert_eq!(stats.live_assets, 2);
    }

    #[test]
    fn test_summary_empty_subset() {
        let stats = SummaryStats::from_subset(&[], 0, W);
        assert_eq!(stats.max_concurrent_plays, 0);
        assert_eq!(stats.avg_session_time, "0 mins");
        assert_eq!(stats.avg_rbr, "0%");
        assert_eq!(stats.live_assets, 0);
        assert_eq!(stats, SummaryStats::default());
    }

    #[test]
    fn test_human_format() {
        assert_eq!(human_format(0), "0");
        assert_eq!(human_format(999), "999");
        assert_eq!(human_format(1_234), "1K");
        assert_eq!(human_format(2_500_000), "2M");
    }
}
