//! # Span Extractor
//!
//! Runs the black-box entity tagger and the regex rule battery over a
//! normalized document and collects raw [`CandidateSpan`]s.
//!
//! The tagger is an external capability behind the [`EntityTagger`] trait
//! (`text → spans`), so the concrete model can be swapped — another
//! checkpoint, a remote inference service, or the rule-only fallback —
//! without touching anything downstream.
//!
//! ## Chunking
//!
//! The tagger has a bounded input window, so the document is partitioned into
//! chunks of at most ~350 characters, cut only *after* sentence-terminal
//! punctuation so no chunk straddles a sentence boundary. Chunks are
//! contiguous slices of the document, which keeps chunk-local offsets exactly
//! translatable to document-global ones.
//!
//! ## Offset recovery
//!
//! The tagger's own offsets drift across its internal tokenization, so they
//! are not trusted: each returned word is re-located inside its chunk by
//! exact substring search, and every occurrence becomes a candidate span.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TaggerError;
use crate::label::EntityLabel;
use crate::rules::RegexRules;
use crate::span::{CandidateSpan, SpanSource};

/// Default chunk budget in characters.
pub const MAX_CHUNK_CHARS: usize = 350;

/// One raw prediction from the entity tagger, as it comes over the wire.
/// `start`/`end` are chunk-local and unreliable (see module docs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggerSpan {
    pub word: String,
    pub entity_group: String,
    pub score: f64,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
}

/// The black-box neural tagger boundary.
///
/// A failed call means "no model spans for that chunk"; the extractor logs
/// and continues, and regex-sourced spans are unaffected.
pub trait EntityTagger {
    fn tag(&self, chunk: &str) -> Result<Vec<TaggerSpan>, TaggerError>;
}

// lets callers pick the tagger at runtime (remote service vs. rule-only)
impl EntityTagger for Box<dyn EntityTagger + Send + Sync> {
    fn tag(&self, chunk: &str) -> Result<Vec<TaggerSpan>, TaggerError> {
        (**self).tag(chunk)
    }
}

/// Rule-only fallback tagger: answers with the regex battery's matches.
/// Useful when no model service is reachable and for offline tests.
pub struct RuleOnlyTagger {
    rules: RegexRules,
}

impl RuleOnlyTagger {
    pub fn new() -> Self {
        Self {
            rules: RegexRules::new(),
        }
    }
}

impl Default for RuleOnlyTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityTagger for RuleOnlyTagger {
    fn tag(&self, chunk: &str) -> Result<Vec<TaggerSpan>, TaggerError> {
        Ok(self
            .rules
            .apply(chunk)
            .into_iter()
            .map(|s| TaggerSpan {
                word: s.text,
                entity_group: s.label.name().to_string(),
                score: s.score,
                start: s.start,
                end: s.end,
            })
            .collect())
    }
}

/// Splits `text` into sentence slices, cutting after sentence-terminal
/// punctuation and newlines. Returns `(byte_offset, slice)` pairs covering
/// the whole text.
pub fn split_sentences(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?' | '…' | '"' | '\n') {
            let end = i + c.len_utf8();
            out.push((start, &text[start..end]));
            start = end;
        }
    }
    if start < text.len() {
        out.push((start, &text[start..]));
    }
    out
}

/// Packs consecutive sentences into chunks of at most `max_chars` characters.
/// A single sentence longer than the budget becomes its own chunk. Chunks are
/// contiguous slices, so `(offset, chunk)` translates local to global offsets
/// by plain addition.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<(usize, &str)> {
    let mut chunks = Vec::new();
    let mut chunk_start: Option<usize> = None;
    let mut chunk_end = 0usize;
    let mut chunk_chars = 0usize;

    for (offset, sentence) in split_sentences(text) {
        let sentence_chars = sentence.chars().count();
        match chunk_start {
            Some(_) if chunk_chars + sentence_chars <= max_chars => {
                chunk_end = offset + sentence.len();
                chunk_chars += sentence_chars;
            }
            Some(start) => {
                chunks.push((start, &text[start..chunk_end]));
                chunk_start = Some(offset);
                chunk_end = offset + sentence.len();
                chunk_chars = sentence_chars;
            }
            None => {
                chunk_start = Some(offset);
                chunk_end = offset + sentence.len();
                chunk_chars = sentence_chars;
            }
        }
    }
    if let Some(start) = chunk_start {
        chunks.push((start, &text[start..chunk_end]));
    }
    chunks
}

/// Cleans a word returned by the tagger: drops invisible characters and
/// rejects fragments that are empty or consist solely of bracket/punctuation
/// characters.
pub fn clean_word(word: &str) -> Option<String> {
    let cleaned = word
        .replace(['\u{200b}', '\u{00a0}'], "")
        .trim()
        .to_string();
    if cleaned.is_empty()
        || cleaned
            .chars()
            .all(|c| matches!(c, '(' | ')' | '[' | ']' | '-' | '–' | '—' | '.' | ',' | '"' | '\'' | '«' | '»') || c.is_whitespace())
    {
        None
    } else {
        Some(cleaned)
    }
}

/// Runs the tagger per chunk plus the regex battery over the whole document.
pub struct SpanExtractor<T: EntityTagger> {
    tagger: T,
    rules: RegexRules,
    max_chunk_chars: usize,
}

impl<T: EntityTagger> SpanExtractor<T> {
    pub fn new(tagger: T) -> Self {
        Self {
            tagger,
            rules: RegexRules::new(),
            max_chunk_chars: MAX_CHUNK_CHARS,
        }
    }

    pub fn with_chunk_budget(mut self, max_chars: usize) -> Self {
        self.max_chunk_chars = max_chars.max(1);
        self
    }

    /// Extracts all candidate spans with document-global offsets.
    ///
    /// Exact duplicates — same `(start, end, label, text)` — are dropped here;
    /// overlapping near-duplicates are left for the reconciler.
    pub fn extract(&self, text: &str) -> Vec<CandidateSpan> {
        let mut seen: HashSet<(usize, usize, EntityLabel, String)> = HashSet::new();
        let mut out = Vec::new();

        for (offset, chunk) in chunk_text(text, self.max_chunk_chars) {
            let predictions = match self.tagger.tag(chunk) {
                Ok(p) => p,
                Err(err) => {
                    warn!(%err, offset, "tagger failed on chunk, dropping its model spans");
                    continue;
                }
            };
            for pred in predictions {
                let Some(label) = EntityLabel::parse(&pred.entity_group) else {
                    continue;
                };
                let Some(word) = clean_word(&pred.word) else {
                    continue;
                };
                // every occurrence of the word inside this chunk becomes a span
                let mut from = 0usize;
                while let Some(pos) = chunk[from..].find(word.as_str()) {
                    let start = offset + from + pos;
                    let end = start + word.len();
                    from += pos + word.len();
                    let span = CandidateSpan {
                        start,
                        end,
                        label,
                        text: word.clone(),
                        score: pred.score,
                        source: SpanSource::Model,
                    };
                    if seen.insert(span.dedup_key()) {
                        out.push(span);
                    }
                }
            }
        }

        for span in self.rules.apply(text) {
            if seen.insert(span.dedup_key()) {
                out.push(span);
            }
        }
        out
    }

    /// Extracts many documents in parallel. Each document is independent, so
    /// this is a plain parallel map with no shared mutable state.
    pub fn extract_batch(&self, texts: &[String]) -> Vec<Vec<CandidateSpan>>
    where
        T: Sync,
    {
        use rayon::prelude::*;
        texts.par_iter().map(|t| self.extract(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic fake tagger for tests: returns fixed predictions for any
    /// chunk that contains the configured word.
    pub(crate) struct FixedTagger {
        pub answers: Vec<(String, EntityLabel, f64)>,
    }

    impl EntityTagger for FixedTagger {
        fn tag(&self, chunk: &str) -> Result<Vec<TaggerSpan>, TaggerError> {
            Ok(self
                .answers
                .iter()
                .filter(|(word, _, _)| chunk.contains(word.as_str()))
                .map(|(word, label, score)| TaggerSpan {
                    word: word.clone(),
                    entity_group: label.name().to_string(),
                    score: *score,
                    start: 0,
                    end: 0,
                })
                .collect())
        }
    }

    struct FailingTagger;

    impl EntityTagger for FailingTagger {
        fn tag(&self, _chunk: &str) -> Result<Vec<TaggerSpan>, TaggerError> {
            Err(TaggerError("connection refused".to_string()))
        }
    }

    #[test]
    fn test_sentences_cover_text() {
        let text = "ประโยคแรก. ประโยคสอง! และท้ายที่ไม่มีจุด";
        let sentences = split_sentences(text);
        let rebuilt: String = sentences.iter().map(|(_, s)| *s).collect();
        assert_eq!(rebuilt, text);
        assert_eq!(sentences.len(), 3);
    }

    #[test]
    fn test_chunks_respect_budget_and_boundaries() {
        let text = "หนึ่ง. สอง. สาม. สี่.";
        // budget of 8 chars: no two adjacent sentences fit together
        let chunks = chunk_text(text, 8);
        assert!(chunks.len() > 1);
        let rebuilt: String = chunks.iter().map(|(_, c)| *c).collect();
        assert_eq!(rebuilt, text);
        for (offset, chunk) in &chunks {
            assert_eq!(&text[*offset..*offset + chunk.len()], *chunk);
        }
    }

    #[test]
    fn test_oversized_sentence_is_own_chunk() {
        let text = "ยาวมากไม่มีจุดจบเลยสักนิดเดียว";
        let chunks = chunk_text(text, 5);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].1, text);
    }

    #[test]
    fn test_clean_word() {
        assert_eq!(clean_word(" สมชาย\u{200b} "), Some("สมชาย".to_string()));
        assert_eq!(clean_word("(...)"), None);
        assert_eq!(clean_word("  "), None);
        assert_eq!(clean_word("—"), None);
    }

    #[test]
    fn test_extract_relocates_and_dedups() {
        let tagger = FixedTagger {
            answers: vec![("สมชาย".to_string(), EntityLabel::Person, 0.9)],
        };
        let extractor = SpanExtractor::new(tagger);
        let text = "สมชาย พบ สมชาย";
        let spans = extractor.extract(text);
        let persons: Vec<_> = spans
            .iter()
            .filter(|s| s.label == EntityLabel::Person)
            .collect();
        assert_eq!(persons.len(), 2, "both occurrences located");
        for span in persons {
            assert_eq!(&text[span.start..span.end], "สมชาย");
        }
    }

    #[test]
    fn test_tagger_failure_keeps_regex_spans() {
        let extractor = SpanExtractor::new(FailingTagger);
        let spans = extractor.extract("ราคา 500 บาท วันนี้");
        assert!(spans.iter().all(|s| s.source != SpanSource::Model));
        assert!(spans
            .iter()
            .any(|s| s.label == EntityLabel::Money && s.text == "500 บาท"));
    }

    #[test]
    fn test_invalid_label_is_dropped() {
        struct MiscTagger;
        impl EntityTagger for MiscTagger {
            fn tag(&self, _chunk: &str) -> Result<Vec<TaggerSpan>, TaggerError> {
                Ok(vec![TaggerSpan {
                    word: "อะไรสักอย่าง".to_string(),
                    entity_group: "MISC".to_string(),
                    score: 0.99,
                    start: 0,
                    end: 0,
                }])
            }
        }
        let extractor = SpanExtractor::new(MiscTagger);
        let spans = extractor.extract("อะไรสักอย่าง เกิดขึ้น");
        assert!(spans.iter().all(|s| s.source != SpanSource::Model));
    }
}
