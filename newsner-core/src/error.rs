//! Error types for the corpus pipeline.
//!
//! The deterministic core (normalize, reconcile, align, repair) is total and
//! has no error path. Failures only arise at the boundaries: file I/O, JSON
//! records, configuration, and the external entity-tagger service.

use thiserror::Error;

/// Failure of the black-box entity tagger on one chunk. The extractor treats
/// this as "no model spans for that chunk" and keeps going.
#[derive(Debug, Clone, Error)]
#[error("entity tagger failed: {0}")]
pub struct TaggerError(pub String);

/// Top-level library error.
#[derive(Debug, Error)]
pub enum NerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Tagger(#[from] TaggerError),
}
