//! CSV parser for session telemetry snapshots.
//!
//! The `ts` column holds a relative offset in minutes. Each record is placed
//! at `anchor - (ts - 20) minutes`, so the snapshot always looks current
//! while keeping its original spacing.

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;

use crate::error::DataError;
use crate::pipeline::types::{NANOS_PER_MINUTE, SessionRecord};

/// Minutes the freshest offsets are shifted past the anchor.
pub const ANCHOR_LEAD_MINUTES: f64 = 20.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSessionRow {
    ts: f64,
    asset: String,
    device: String,
    state: String,
    concurrent_plays: u32,
    session_length: f64,
    rbr: f64,
    is_vsf: f64,
    is_ebvs: f64,
    just_joined: f64,
}

/// Parses a headered CSV snapshot into anchored [`SessionRecord`]s.
///
/// # Errors
///
/// The first malformed row aborts the load with a [`DataError`] naming its
/// 1-based data row.
pub fn parse_sessions(bytes: &[u8], anchor: DateTime<Utc>) -> Result<Vec<SessionRecord>, DataError> {
    let anchor_ns = anchor.timestamp_nanos_opt().ok_or(DataError::AnchorOutOfRange)?;

    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(bytes);
    let mut records = Vec::new();

    for (idx, result) in rdr.deserialize::<RawSessionRow>().enumerate() {
        let row = idx + 1;
        let raw = result.map_err(|source| DataError::Csv { row, source })?;
        records.push(validate(raw, row, anchor_ns)?);
    }

    Ok(records)
}

/// Converts a relative minute offset into an absolute epoch-nanosecond instant.
pub fn anchored_ts(offset_minutes: f64, anchor_ns: i64) -> Option<i64> {
    let shift = ((offset_minutes - ANCHOR_LEAD_MINUTES) * NANOS_PER_MINUTE as f64).round();
    if !shift.is_finite() || shift.abs() >= i64::MAX as f64 {
        return None;
    }
    anchor_ns.checked_sub(shift as i64)
}

fn validate(raw: RawSessionRow, row: usize, anchor_ns: i64) -> Result<SessionRecord, DataError> {
    let invalid = |field: &'static str, reason: String| DataError::InvalidField { row, field, reason };

    let ts = anchored_ts(raw.ts, anchor_ns)
        .ok_or_else(|| invalid("ts", format!("offset {} is out of range", raw.ts)))?;

    if raw.asset.is_empty() {
        return Err(invalid("asset", "empty".to_string()));
    }
    if raw.device.is_empty() {
        return Err(invalid("device", "empty".to_string()));
    }
    if raw.state.len() != 2 || !raw.state.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid(
            "state",
            format!("'{}' is not a two-letter code", raw.state),
        ));
    }

    for (field, value) in [
        ("sessionLength", raw.session_length),
        ("rbr", raw.rbr),
        ("isVsf", raw.is_vsf),
        ("isEbvs", raw.is_ebvs),
    ] {
        if !value.is_finite() {
            return Err(invalid(field, format!("{value} is not finite")));
        }
    }

    let just_joined = match raw.just_joined {
        v if v == 0.0 => 0,
        v if v == 1.0 => 1,
        v => return Err(invalid("justJoined", format!("{v} is not 0 or 1"))),
    };

    Ok(SessionRecord {
        asset: raw.asset,
        device: raw.device,
        ts,
        state: raw.state.to_ascii_uppercase(),
        concurrent_plays: raw.concurrent_plays,
        session_length: raw.session_length,
        rbr: raw.rbr,
        is_vsf: raw.is_vsf,
        is_ebvs: raw.is_ebvs,
        just_joined,
    })
}
