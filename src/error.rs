//! Error taxonomy for the recommender core.
//!
//! Every error is local to one request; shared state is never left
//! half-mutated. Unknown users are not an error anywhere in the core — they
//! degrade to cold-start defaults.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommenderError {
    /// The event cannot be encoded into a chain state.
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Privacy level outside the configured bounds. The profile is unchanged.
    #[error("privacy level {level} outside allowed range [{min}, {max}]")]
    InvalidPrivacyLevel { level: i32, min: i32, max: i32 },

    /// A model snapshot with a version this build does not understand.
    #[error("unsupported snapshot version {0}")]
    SnapshotVersion(u32),

    /// Snapshot bytes that could not be decoded.
    #[error("malformed snapshot: {0}")]
    SnapshotDecode(String),
}

pub type Result<T> = std::result::Result<T, RecommenderError>;
