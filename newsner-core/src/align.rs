//! # Tokenizer-to-Span Alignment
//!
//! Word segmentation for Thai is an external capability (there is no
//! whitespace between words), so the pipeline receives tokens as plain
//! strings behind the [`WordTokenizer`] trait and recovers their character
//! offsets itself.
//!
//! Two steps:
//!
//! 1. [`align_tokens`] walks the token list left to right, locating each
//!    token in the text by substring search from a moving cursor. A token
//!    that cannot be found verbatim (normalization drift) is *assumed* to sit
//!    at the cursor — alignment never fails and always yields exactly one
//!    offset pair per token.
//! 2. [`assign_tags`] maps each entity span onto tokens with the
//!    **half-overlap rule**: a token belongs to an entity only if the entity
//!    covers at least 50% of the token's own length. The left-most matched
//!    token gets `B-`, the rest `I-`.
//!
//! When spans of different labels claim the same token, the higher-scoring
//! span wins: spans are applied in ascending score order so the most
//! confident one writes last. This makes the tie-break an explicit policy
//! instead of an accident of processing order.

use crate::label::Tag;
use crate::span::EntitySpan;

/// External word-segmentation boundary.
///
/// Production deployments plug a real Thai segmenter in here (the
/// `thai-tokenizer` feature ships a newmm implementation);
/// [`SpaceTokenizer`] is the built-in stand-in that relies on the
/// normalizer's punctuation spacing.
pub trait WordTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Whitespace tokenizer. Coarse for Thai (an unsegmented clause becomes one
/// token), but safe: it never invents offsets the aligner cannot find.
pub struct SpaceTokenizer;

impl WordTokenizer for SpaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// Maps each token to a `(start, end)` byte range in `text`.
///
/// Forward substring search from a cursor; on a miss the token is assumed to
/// occupy `[cursor, cursor + len)` unverified and the cursor advances anyway.
/// Worst case is a slightly misaligned mapping, never a failure.
pub fn align_tokens(text: &str, tokens: &[String]) -> Vec<(usize, usize)> {
    let mut spans = Vec::with_capacity(tokens.len());
    let mut cursor = 0usize;
    for token in tokens {
        let found = text
            .get(cursor..)
            .and_then(|rest| rest.find(token.as_str()));
        let (start, end) = match found {
            Some(pos) => (cursor + pos, cursor + pos + token.len()),
            None => (cursor, cursor + token.len()),
        };
        spans.push((start, end));
        cursor = end;
    }
    spans
}

/// Assigns IOB tags to tokens from reconciled entity spans.
///
/// Half-overlap rule: token `[a,b)` belongs to entity `[s,t)` iff
/// `min(b,t) - max(a,s)` is positive and at least `(b-a)/2` (integer-safe as
/// `2*overlap >= b-a`, so exactly 50% is in, 49% is out).
///
/// The output is *not* repaired; callers run [`crate::label::repair_tags`]
/// afterwards, because overwrites between overlapping spans can orphan an
/// inside-tag.
pub fn assign_tags(token_spans: &[(usize, usize)], entities: &[EntitySpan]) -> Vec<Tag> {
    let mut tags = vec![Tag::Outside; token_spans.len()];

    // ascending score: the highest-confidence span writes last and wins
    let mut order: Vec<&EntitySpan> = entities.iter().collect();
    order.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
    });

    for entity in order {
        let mut touched = token_spans.iter().enumerate().filter(|(_, &(a, b))| {
            let overlap = b.min(entity.end).saturating_sub(a.max(entity.start));
            overlap > 0 && 2 * overlap >= b - a
        });
        if let Some((first, _)) = touched.next() {
            tags[first] = Tag::Begin(entity.label);
            for (i, _) in touched {
                tags[i] = Tag::Inside(entity.label);
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::EntityLabel;

    fn entity(start: usize, end: usize, label: EntityLabel, score: f64) -> EntitySpan {
        EntitySpan {
            start,
            end,
            label,
            text: String::new(),
            score,
        }
    }

    #[test]
    fn test_align_exact_tokens() {
        let text = "สมชาย ไป ตลาด";
        let tokens = vec!["สมชาย".to_string(), "ไป".to_string(), "ตลาด".to_string()];
        let spans = align_tokens(text, &tokens);
        for (token, &(s, e)) in tokens.iter().zip(&spans) {
            assert_eq!(&text[s..e], token);
        }
    }

    #[test]
    fn test_align_repeated_token_advances_cursor() {
        let text = "ไป และ ไป";
        let tokens = vec!["ไป".to_string(), "ไป".to_string()];
        let spans = align_tokens(text, &tokens);
        assert_eq!(spans[0].0, 0);
        assert!(spans[1].0 > spans[0].1, "second occurrence, not the first");
    }

    #[test]
    fn test_align_fallback_never_fails() {
        let text = "สั้น";
        let tokens = vec![
            "ไม่อยู่".to_string(),
            "ก็ไม่อยู่".to_string(),
            "เช่นกัน".to_string(),
        ];
        let spans = align_tokens(text, &tokens);
        assert_eq!(spans.len(), tokens.len());
        // fallback keeps one pair per token and a monotonic cursor
        assert!(spans.windows(2).all(|w| w[0].1 <= w[1].0));
    }

    #[test]
    fn test_half_overlap_boundary() {
        // one 100-byte token, entities overlapping exactly 50 and 49 bytes
        let token_spans = vec![(0usize, 100usize)];
        let covers_half = entity(50, 150, EntityLabel::Person, 0.9);
        let covers_less = entity(51, 150, EntityLabel::Person, 0.9);

        let tags = assign_tags(&token_spans, &[covers_half]);
        assert_eq!(tags[0], Tag::Begin(EntityLabel::Person));

        let tags = assign_tags(&token_spans, &[covers_less]);
        assert_eq!(tags[0], Tag::Outside);
    }

    #[test]
    fn test_first_token_begin_rest_inside() {
        let token_spans = vec![(0, 4), (5, 9), (10, 14), (15, 19)];
        let tags = assign_tags(&token_spans, &[entity(5, 14, EntityLabel::Money, 1.0)]);
        assert_eq!(
            tags,
            vec![
                Tag::Outside,
                Tag::Begin(EntityLabel::Money),
                Tag::Inside(EntityLabel::Money),
                Tag::Outside,
            ]
        );
    }

    #[test]
    fn test_conflict_highest_score_wins() {
        let token_spans = vec![(0, 4), (5, 9)];
        let weak = entity(0, 9, EntityLabel::Organization, 0.81);
        let strong = entity(0, 4, EntityLabel::Person, 0.97);
        // order of the input list must not matter
        for entities in [vec![weak.clone(), strong.clone()], vec![strong, weak]] {
            let tags = assign_tags(&token_spans, &entities);
            assert_eq!(tags[0], Tag::Begin(EntityLabel::Person));
            assert_eq!(tags[1], Tag::Inside(EntityLabel::Organization));
        }
    }

    #[test]
    fn test_stray_single_byte_overlap_ignored() {
        let token_spans = vec![(0, 10), (10, 20)];
        // touches the second token by one byte only
        let tags = assign_tags(&token_spans, &[entity(2, 11, EntityLabel::Law, 0.9)]);
        assert_eq!(tags[0], Tag::Begin(EntityLabel::Law));
        assert_eq!(tags[1], Tag::Outside);
    }
}
