//! # Entity Spans
//!
//! Half-open byte-offset ranges into a specific text buffer, with a label and a
//! confidence score. A span is only meaningful together with the buffer it was
//! produced from; every stage of the pipeline hands both along.
//!
//! Two flavors exist, mirroring the span lifecycle:
//!
//! - [`CandidateSpan`]: raw output of the extractor, still carrying its
//!   provenance ([`SpanSource`]). Candidates may overlap and duplicate.
//! - [`EntitySpan`]: a reconciled span. Provenance is dropped here; downstream
//!   only the label, position and score matter.

use serde::{Deserialize, Serialize};

use crate::label::EntityLabel;

/// Where a candidate span came from. Carried only until reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanSource {
    /// The black-box neural tagger.
    Model,
    /// A named regex rule (e.g. "date", "money").
    Rule(&'static str),
}

impl std::fmt::Display for SpanSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpanSource::Model => write!(f, "model"),
            SpanSource::Rule(name) => write!(f, "regex:{name}"),
        }
    }
}

/// An unreconciled entity span as produced by the extractor.
///
/// Invariant: `start < end` and both offsets lie on character boundaries of the
/// buffer the span was extracted from.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSpan {
    /// Byte offset of the first character (inclusive).
    pub start: usize,
    /// Byte offset past the last character (exclusive).
    pub end: usize,
    pub label: EntityLabel,
    /// The covered text fragment.
    pub text: String,
    /// Confidence in `[0, 1]`. Regex-sourced spans are always 1.0.
    pub score: f64,
    pub source: SpanSource,
}

impl CandidateSpan {
    /// De-duplication key: exact duplicates across sources are collapsed at
    /// extraction time; near-duplicates flow on to the reconciler.
    pub fn dedup_key(&self) -> (usize, usize, EntityLabel, String) {
        (self.start, self.end, self.label, self.text.clone())
    }
}

/// A reconciled entity span, ready for token alignment or rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
    pub text: String,
    pub score: f64,
}

impl EntitySpan {
    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `self` fully contains `other` and is strictly longer.
    /// Used by containment pruning (same-label spans only).
    pub fn strictly_contains(&self, other: &EntitySpan) -> bool {
        self.start <= other.start && self.end >= other.end && self.len() > other.len()
    }
}
