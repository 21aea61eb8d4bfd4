//! Base dataset: loading, gzip detection, and the process-wide read-only copy.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::error::DataError;
use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::parser::parse_sessions;
use crate::pipeline::types::{SessionRecord, TimeRange};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

static DATASET: OnceCell<Arc<Dataset>> = OnceCell::new();

/// The session snapshot every recompute filters. Never mutated after load.
#[derive(Debug)]
pub struct Dataset {
    records: Vec<SessionRecord>,
    anchor: DateTime<Utc>,
    min_ts: i64,
    max_ts: i64,
}

impl Dataset {
    pub fn new(records: Vec<SessionRecord>, anchor: DateTime<Utc>) -> Result<Self, DataError> {
        let min_ts = records.iter().map(|r| r.ts).min().ok_or(DataError::Empty)?;
        let max_ts = records.iter().map(|r| r.ts).max().ok_or(DataError::Empty)?;

        Ok(Self {
            records,
            anchor,
            min_ts,
            max_ts,
        })
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn min_ts(&self) -> i64 {
        self.min_ts
    }

    pub fn max_ts(&self) -> i64 {
        self.max_ts
    }

    /// Default time window covering every record.
    pub fn full_range(&self) -> TimeRange {
        TimeRange::full(self.min_ts, self.max_ts)
    }

    pub fn assets(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.asset.as_str()).collect()
    }

    pub fn devices(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.device.as_str()).collect()
    }

    pub fn states(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.state.as_str()).collect()
    }
}

/// Installs the base dataset. Only the first call succeeds.
pub fn init(dataset: Dataset) -> Result<Arc<Dataset>, DataError> {
    let shared = Arc::new(dataset);
    DATASET
        .set(Arc::clone(&shared))
        .map_err(|_| DataError::AlreadyLoaded)?;
    Ok(shared)
}

/// The installed base dataset, if [`init`] has run.
pub fn get() -> Option<Arc<Dataset>> {
    DATASET.get().cloned()
}

/// Loads a snapshot from a local path or an `http(s)://` URL.
pub async fn load(source: &str, anchor: DateTime<Utc>) -> Result<Dataset, DataError> {
    if is_url(source) {
        let client = BasicClient::new().map_err(|e| DataError::Fetch {
            url: source.to_string(),
            reason: e.to_string(),
        })?;
        load_with_client(&client, source, anchor).await
    } else {
        let bytes = tokio::fs::read(source)
            .await
            .map_err(|source_err| DataError::FileRead {
                path: PathBuf::from(source),
                source: source_err,
            })?;
        from_bytes(&bytes, anchor)
    }
}

/// Like [`load`] for URLs, with a caller-supplied transport.
#[tracing::instrument(skip(client, anchor))]
pub async fn load_with_client<C: HttpClient>(
    client: &C,
    url: &str,
    anchor: DateTime<Utc>,
) -> Result<Dataset, DataError> {
    let bytes = fetch_bytes(client, url)
        .await
        .map_err(|e| DataError::Fetch {
            url: url.to_string(),
            reason: format!("{e:#}"),
        })?;
    debug!(bytes = bytes.len(), "Dataset bytes received");
    from_bytes(&bytes, anchor)
}

/// Parses raw (optionally gzip-compressed) CSV bytes into a [`Dataset`].
pub fn from_bytes(bytes: &[u8], anchor: DateTime<Utc>) -> Result<Dataset, DataError> {
    let records = if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut decoded)
            .map_err(DataError::Decompress)?;
        debug!(compressed = bytes.len(), decoded = decoded.len(), "Decompressed gzip dataset");
        parse_sessions(&decoded, anchor)?
    } else {
        parse_sessions(bytes, anchor)?
    };

    let dataset = Dataset::new(records, anchor)?;
    info!(
        records = dataset.records.len(),
        min_ts = dataset.min_ts,
        max_ts = dataset.max_ts,
        "Dataset loaded"
    );
    Ok(dataset)
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
