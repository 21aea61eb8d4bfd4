//! Error types for dataset loading, configuration, and forecasting.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure while loading the session snapshot. Fatal at startup.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read dataset: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch dataset from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to decompress gzip dataset")]
    Decompress(#[source] std::io::Error),

    #[error("Malformed CSV at row {row}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid value for '{field}' at row {row}: {reason}")]
    InvalidField {
        row: usize,
        field: &'static str,
        reason: String,
    },

    #[error("Anchor instant cannot be represented in epoch nanoseconds")]
    AnchorOutOfRange,

    #[error("Dataset contains no session records")]
    Empty,

    #[error("Dataset already loaded")]
    AlreadyLoaded,
}

/// Why an autoregressive or trend fit was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("series contains NaN or infinite values")]
    NonFinite,

    #[error("series has zero variance")]
    Degenerate,

    #[error("AR coefficients {coefficients:?} are at or near a unit root")]
    NonStationary { coefficients: Vec<f64> },

    #[error("MA coefficient {theta} is not invertible")]
    NonInvertible { theta: f64 },

    #[error("unsupported differencing order {0}")]
    UnsupportedOrder(usize),
}

/// The forecast segment could not be produced. Recovered by the merger,
/// which renders the historical series alone.
#[derive(Error, Debug)]
pub enum ForecastUnavailable {
    #[error("series has {actual} buckets, need at least {required}")]
    TooShort { required: usize, actual: usize },

    #[error("trend fit failed: {0}")]
    Trend(FitError),

    #[error("autoregressive fit failed ({primary}); relaxed fit failed ({relaxed})")]
    NoConvergence { primary: FitError, relaxed: FitError },

    #[error("model fit exceeded {0:?}")]
    Timeout(Duration),

    #[error("forecast task failed")]
    TaskJoin(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{var}' has invalid value '{value}'")]
    InvalidVar { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),
}
