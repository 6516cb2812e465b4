//! Error types for data loading and recommendation

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load one of the externally supplied JSON payloads
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("payload {0:?} is empty")]
    EmptyPayload(PathBuf),

    #[error("invalid calibration curve: {0}")]
    InvalidCurve(String),
}

/// Internal failure while computing a recommendation
///
/// The expected "cannot recommend" outcomes never surface here: they are
/// absorbed by `can_recommend` and yield an empty result instead.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("recommender backing data is not loaded")]
    NotReady,

    #[error("donor pool is empty")]
    EmptyDonorPool,

    #[error("client profile is missing required field {0}")]
    IncompleteProfile(&'static str),

    #[error("recommendation timed out")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(String),
}
