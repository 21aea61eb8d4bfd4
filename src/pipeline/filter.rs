//! Row filter: attribute membership plus a strict time window.

use std::collections::BTreeSet;

use crate::pipeline::types::{SessionRecord, TimeRange};

/// Returns the records whose asset and device are both members of the given
/// sets and whose timestamp lies strictly inside `range`.
///
/// An empty asset or device set selects nothing. The time bounds are
/// exclusive on both ends; callers pass padded bounds (see
/// [`TimeRange::full`]).
pub fn filter<'a>(
    records: &'a [SessionRecord],
    assets: &BTreeSet<String>,
    devices: &BTreeSet<String>,
    range: TimeRange,
) -> Vec<&'a SessionRecord> {
    if assets.is_empty() || devices.is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .filter(|r| {
            assets.contains(&r.asset) && devices.contains(&r.device) && range.contains_strict(r.ts)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(asset: &str, device: &str, ts: i64) -> SessionRecord {
        SessionRecord {
            asset: asset.to_string(),
            device: device.to_string(),
            ts,
            state: "NY".to_string(),
            concurrent_plays: 1,
            session_length: 10.0,
            rbr: 0.5,
            is_vsf: 0.0,
            is_ebvs: 0.0,
            just_joined: 1,
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Vec<SessionRecord> {
        vec![
            record("live-a", "AppleTV", 100),
            record("live-a", "iPhone", 200),
            record("rec-b", "AppleTV", 300),
            record("rec-b", "Browser", 400),
            record("live-c", "RokuTV", 500),
        ]
    }

    #[test]
    fn test_filter_by_membership() {
        let records = sample();
        let out = filter(
            &records,
            &set(&["live-a", "rec-b"]),
            &set(&["AppleTV"]),
            TimeRange::new(0, 1_000),
        );
        let ts: Vec<i64> = out.iter().map(|r| r.ts).collect();
        assert_eq!(ts, vec![100, 300]);
    }

    #[test]
    fn test_empty_asset_set_selects_nothing() {
        let records = sample();
        let out = filter(
            &records,
            &BTreeSet::new(),
            &set(&["AppleTV", "iPhone", "Browser", "RokuTV"]),
            TimeRange::new(0, 1_000),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_device_set_selects_nothing() {
        let records = sample();
        let out = filter(
            &records,
            &set(&["live-a", "rec-b", "live-c"]),
            &BTreeSet::new(),
            TimeRange::new(0, 1_000),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_time_bounds_are_strict() {
        let records = sample();
        let all_assets = set(&["live-a", "rec-b", "live-c"]);
        let all_devices = set(&["AppleTV", "iPhone", "Browser", "RokuTV"]);

        let out = filter(&records, &all_assets, &all_devices, TimeRange::new(100, 500));
        let ts: Vec<i64> = out.iter().map(|r| r.ts).collect();
        assert_eq!(ts, vec![200, 300, 400]);
    }

    #[test]
    fn test_disjoint_asset_sets_never_overlap() {
        let records = sample();
        let devices = set(&["AppleTV", "iPhone", "Browser", "RokuTV"]);
        let range = TimeRange::new(0, 1_000);

        let left = filter(&records, &set(&["live-a"]), &devices, range);
        let right = filter(&records, &set(&["rec-b", "live-c"]), &devices, range);

        assert_eq!(left.len() + right.len(), records.len());
        for l in &left {
            assert!(!right.iter().any(|r| std::ptr::eq(*l, *r)));
        }
    }
}
