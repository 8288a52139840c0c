//! # Span Reconciler
//!
//! Turns the extractor's raw, overlapping candidate spans into a clean entity
//! set for one document. Applied per document; documents never share state.
//!
//! Passes, in order:
//!
//! 1. **Date-span extension** — a DATE span cut off before its two-digit year
//!    ("15 ธ.ค." + "67") is widened across the separator gap.
//! 2. **Lexical filters** — stopwords, too-short fragments, pure
//!    numeric/punctuation tokens, per-label blacklists.
//! 3. **Relabeling** — generic role words (รัฐบาล, นายกรัฐมนตรี, …) tagged as
//!    PERSON denote an institution or office, not an individual; they become
//!    ORGANIZATION instead of being dropped.
//! 4. **Confidence thresholds** — per-label minimum scores
//!    ([`EntityLabel::min_confidence`]).
//! 5. **Containment pruning** — of two same-label spans where one strictly
//!    contains the other, the shorter is dropped.
//!
//! Output is deterministic for a fixed input: spans are ordered by position.

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::label::EntityLabel;
use crate::span::{CandidateSpan, EntitySpan};

/// Thai function words that are never entities on their own.
const STOPWORDS: &[&str] = &[
    "ของ", "ที่", "ใน", "โดย", "กับ", "เป็น", "เมื่อ", "ได้", "จะ", "และ", "หรือ", "จาก", "ถึง",
    "ฯ", "ฯลฯ", "ข่าว", "สำนักข่าว", "วันนี้", "เมื่อวาน", "ผู้สื่อข่าว", "รายงาน", "ภาพ", "คลิป",
];

/// Vague calendar words the date rules occasionally swallow.
const DATE_STOPWORDS: &[&str] = &["สิ้นเดือน", "ต้นเดือน", "กลางเดือน", "ปลายเดือน", "ต.ค."];

/// Role/office words the model likes to tag as PERSON. They name an
/// institution, so they are relabeled ORGANIZATION rather than dropped.
const INSTITUTION_WORDS: &[&str] = &[
    "รัฐบาล", "นายกรัฐมนตรี", "รัฐมนตรี", "ผู้ว่าฯ", "ผู้กำกับการ", "คณะกรรมการ", "ตำรวจ",
];

/// Generic determiner words misfiring as ORGANIZATION ("บริษัท" alone is just
/// the word "company").
const ORGANIZATION_BLACKLIST: &[&str] = &["บริษัท"];

/// Separators a date span may jump over when looking for its year fragment.
fn is_date_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{00a0}' | '\u{200b}' | '.' | ',' | '–' | '-' | '•')
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || ('\u{0e50}'..='\u{0e59}').contains(&c)
}

/// The reconciler. Word lists are owned so deployments can extend them.
pub struct Reconciler {
    stopwords: HashSet<String>,
    date_stopwords: HashSet<String>,
    institution_words: HashSet<String>,
    organization_blacklist: HashSet<String>,
}

impl Reconciler {
    pub fn new() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            stopwords: owned(STOPWORDS),
            date_stopwords: owned(DATE_STOPWORDS),
            institution_words: owned(INSTITUTION_WORDS),
            organization_blacklist: owned(ORGANIZATION_BLACKLIST),
        }
    }

    pub fn add_stopword(&mut self, word: &str) {
        self.stopwords.insert(word.to_string());
    }

    /// Reconciles candidate spans against the buffer they were extracted from.
    pub fn reconcile(&self, text: &str, candidates: Vec<CandidateSpan>) -> Vec<EntitySpan> {
        let mut kept: Vec<EntitySpan> = Vec::new();

        for candidate in candidates {
            let mut start = candidate.start;
            let mut end = candidate.end;
            if start >= end || end > text.len() {
                continue;
            }

            if candidate.label == EntityLabel::Date {
                end = extend_date_year(text, start, end);
            }

            // tighten the offsets to the trimmed fragment before filtering
            let fragment = &text[start..end];
            let trimmed = fragment.trim();
            if trimmed.is_empty() {
                continue;
            }
            start += fragment.len() - fragment.trim_start().len();
            end = start + trimmed.len();

            let word = tidy_entity_text(trimmed);
            if word.is_empty() {
                continue;
            }

            let mut label = candidate.label;
            if label == EntityLabel::Person && self.institution_words.contains(&word) {
                label = EntityLabel::Organization;
            }

            if self.stopwords.contains(&word) {
                continue;
            }
            if label == EntityLabel::Date && self.date_stopwords.contains(&word) {
                continue;
            }
            if label == EntityLabel::Organization && self.organization_blacklist.contains(&word) {
                continue;
            }
            if !matches!(label, EntityLabel::Date | EntityLabel::Time) && is_numeric_or_punct(&word)
            {
                continue;
            }
            if !matches!(label, EntityLabel::Date | EntityLabel::Time | EntityLabel::Law)
                && word.graphemes(true).count() < 2
            {
                continue;
            }
            if candidate.score < label.min_confidence() {
                continue;
            }

            kept.push(EntitySpan {
                start,
                end,
                label,
                text: word,
                score: candidate.score,
            });
        }

        let mut pruned = prune_contained(kept);
        pruned.sort_by(|a, b| {
            (a.start, a.end, a.label.name()).cmp(&(b.start, b.end, b.label.name()))
        });
        pruned
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Probes a DATE span for a trailing year continuation: skip separator
/// characters after the span, and if an exactly-two-digit run (Arabic or Thai
/// numerals) follows within the gap, extend the span over it. Recovers
/// day/month fragments whose two-digit year was tagged separately.
pub fn extend_date_year(text: &str, start: usize, end: usize) -> usize {
    let frag = &text[start..end];
    let last = match frag.trim_end().chars().next_back() {
        Some(c) => c,
        None => return end,
    };
    // only probe spans ending in a numeral or an abbreviation period
    if !is_digit(last) && last != '.' {
        return end;
    }

    let mut gap_end = end;
    for c in text[end..].chars() {
        if is_date_separator(c) {
            gap_end += c.len_utf8();
        } else {
            break;
        }
    }

    let mut run_chars = 0usize;
    let mut run_bytes = 0usize;
    for c in text[gap_end..].chars() {
        if is_digit(c) {
            run_chars += 1;
            run_bytes += c.len_utf8();
        } else {
            break;
        }
    }
    // exactly two digits; a longer run is a different number, not a year tail.
    // A zero-width gap is fine after an abbreviation period ("ธ.ค.67"), but
    // not after a digit, where the run is the same number continuing.
    if run_chars == 2 && (gap_end > end || last == '.') {
        gap_end + run_bytes
    } else {
        end
    }
}

/// Strips wrapping brackets and collapses inner whitespace.
fn tidy_entity_text(word: &str) -> String {
    let word = word
        .trim_start_matches(['(', '[', '{'])
        .trim_end_matches([')', ']', '}']);
    word.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True for fragments made only of digits and number punctuation.
fn is_numeric_or_punct(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '/' | ':' | '-'))
}

/// Drops every span strictly contained in a longer span of the same label.
fn prune_contained(spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
    spans
        .iter()
        .filter(|a| {
            !spans
                .iter()
                .any(|b| b.label == a.label && b.strictly_contains(a))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SpanSource;

    fn candidate(
        text: &str,
        word: &str,
        label: EntityLabel,
        score: f64,
    ) -> CandidateSpan {
        let start = text.find(word).expect("word present");
        CandidateSpan {
            start,
            end: start + word.len(),
            label,
            text: word.to_string(),
            score,
            source: SpanSource::Model,
        }
    }

    #[test]
    fn test_date_extension_covers_trailing_year() {
        let text = "ประชุมวันที่ 15 ธ.ค. 67 ที่ทำเนียบ";
        let span = candidate(text, "15 ธ.ค.", EntityLabel::Date, 0.9);
        let out = Reconciler::new().reconcile(text, vec![span]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "15 ธ.ค. 67");
        assert_eq!(&text[out[0].start..out[0].end], "15 ธ.ค. 67");
    }

    #[test]
    fn test_date_extension_covers_unspaced_year() {
        let text = "ประชุมวันที่ 15 ธ.ค.67 ที่ทำเนียบ";
        let span = candidate(text, "15 ธ.ค.", EntityLabel::Date, 0.9);
        let out = Reconciler::new().reconcile(text, vec![span]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "15 ธ.ค.67");
    }

    #[test]
    fn test_date_extension_never_splits_a_digit_run() {
        // span ends mid-number; the trailing digits are not a year
        let text = "เลขที่ 256789 ออกแล้ว";
        let start = "เลขที่ ".len();
        let end = start + "2567".len();
        assert_eq!(extend_date_year(text, start, end), end);
    }

    #[test]
    fn test_date_extension_ignores_four_digit_run() {
        let text = "งบประมาณ 15 ธ.ค. 2567890 บาท";
        let end = "งบประมาณ ".len() + "15 ธ.ค.".len();
        let start = "งบประมาณ ".len();
        assert_eq!(extend_date_year(text, start, end), end);
    }

    #[test]
    fn test_date_extension_requires_adjacency() {
        let text = "15 ธ.ค. ปีหน้า 67";
        assert_eq!(extend_date_year(text, 0, "15 ธ.ค.".len()), "15 ธ.ค.".len());
    }

    #[test]
    fn test_confidence_thresholds_per_label() {
        let text = "สมชาย ไป 15 ธ.ค.";
        let person = candidate(text, "สมชาย", EntityLabel::Person, 0.75);
        let date = candidate(text, "15 ธ.ค.", EntityLabel::Date, 0.75);
        let out = Reconciler::new().reconcile(text, vec![person, date]);
        // PERSON needs ≥ 0.80, DATE only ≥ 0.70
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, EntityLabel::Date);
    }

    #[test]
    fn test_added_stopword_drops_span() {
        let text = "โปรโมชั่น พิเศษวันนี้";
        let span = candidate(text, "โปรโมชั่น", EntityLabel::Organization, 0.99);
        let mut reconciler = Reconciler::new();
        assert_eq!(reconciler.reconcile(text, vec![span.clone()]).len(), 1);
        reconciler.add_stopword("โปรโมชั่น");
        assert!(reconciler.reconcile(text, vec![span]).is_empty());
    }

    #[test]
    fn test_stopword_never_survives() {
        let text = "ของ ดีมาก";
        let span = candidate(text, "ของ", EntityLabel::Person, 0.99);
        assert!(Reconciler::new().reconcile(text, vec![span]).is_empty());
    }

    #[test]
    fn test_institution_word_relabeled_not_dropped() {
        let text = "รัฐบาล แถลงวันนี้";
        let span = candidate(text, "รัฐบาล", EntityLabel::Person, 0.95);
        let out = Reconciler::new().reconcile(text, vec![span]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, EntityLabel::Organization);
    }

    #[test]
    fn test_generic_company_word_dropped() {
        let text = "บริษัท ประกาศกำไร";
        let span = candidate(text, "บริษัท", EntityLabel::Organization, 0.99);
        assert!(Reconciler::new().reconcile(text, vec![span]).is_empty());
    }

    #[test]
    fn test_numeric_fragment_dropped_unless_date_or_time() {
        let text = "หมายเลข 12/34 เวลา 18:00";
        let org = candidate(text, "12/34", EntityLabel::Organization, 0.95);
        let time = candidate(text, "18:00", EntityLabel::Time, 0.95);
        let out = Reconciler::new().reconcile(text, vec![org, time]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, EntityLabel::Time);
    }

    #[test]
    fn test_containment_pruning_same_label() {
        let text = "กระทรวงสาธารณสุขไทย";
        let long = candidate(text, "กระทรวงสาธารณสุขไทย", EntityLabel::Organization, 0.9);
        let short = candidate(text, "กระทรวงสาธารณสุข", EntityLabel::Organization, 0.95);
        let out = Reconciler::new().reconcile(text, vec![short.clone(), long]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "กระทรวงสาธารณสุขไทย");
    }

    #[test]
    fn test_containment_keeps_different_labels() {
        let text = "กรุงเทพมหานคร";
        let loc = candidate(text, "กรุงเทพมหานคร", EntityLabel::Location, 0.9);
        let org = candidate(text, "กรุงเทพ", EntityLabel::Organization, 0.9);
        let out = Reconciler::new().reconcile(text, vec![loc, org]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_bracket_trim() {
        let text = "โดย (สมชาย ใจดี) รายงาน";
        let span = candidate(text, "(สมชาย ใจดี)", EntityLabel::Person, 0.9);
        let out = Reconciler::new().reconcile(text, vec![span]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "สมชาย ใจดี");
    }
}
