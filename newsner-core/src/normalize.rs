//! # Text Normalizer for Scraped Thai News
//!
//! Canonicalizes raw article text before anything else looks at it:
//!
//! 1. Strip HTML tags and characters outside the Basic Multilingual Plane
//!    (removes emoji and pictographs).
//! 2. Unicode NFC composition, then a Thai-specific character pass
//!    (zero-width removal, duplicate tone/vowel marks, decomposed sara am).
//! 3. Unify curly quotes to straight quotes.
//! 4. Apply the noise-pattern table: footer-type patterns **truncate the tail**
//!    (everything from the first match to end-of-string is discarded), inline
//!    noise is spot-removed.
//! 5. Collapse whitespace, then space out segmentation punctuation so that
//!    downstream word/sentence tokenizers see clean boundaries. This pass runs
//!    after all deletions, so the inserted spaces survive.
//!
//! Normalization is idempotent: running it twice yields the same string.
//!
//! The pattern table is corpus-specific and needs continual tuning per news
//! source, so it is data ([`NoiseRules`]): compiled-in defaults, overridable
//! from a JSON file.

use regex::Regex;
use serde::Deserialize;

use crate::error::NerError;

/// What to do with a matched noise pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseAction {
    /// Discard everything from the first match to the end of the string.
    /// For share footers, attribution lines and syndication markers.
    TruncateTail,
    /// Replace every match with a single space. For decorative separators and
    /// stray HTML entities in the middle of the body.
    Remove,
}

/// One entry of the noise-pattern table.
#[derive(Debug)]
pub struct NoisePattern {
    pub name: String,
    pub regex: Regex,
    pub action: NoiseAction,
}

/// Serialized form of a pattern entry, for JSON overrides.
#[derive(Debug, Deserialize)]
struct NoisePatternSpec {
    name: String,
    pattern: String,
    action: NoiseAction,
}

/// Ordered noise-pattern table. Order matters: inline noise is scrubbed before
/// the tail truncations run, matching how the scraped corpus was cleaned.
#[derive(Debug)]
pub struct NoiseRules {
    patterns: Vec<NoisePattern>,
}

impl NoiseRules {
    /// The built-in table, tuned against the Thai news sources the harvester
    /// polls (share widgets, photo credits, syndication footers).
    pub fn builtin() -> Self {
        let spot: &[(&str, &str)] = &[
            ("html_entity_bracket", r"\[&#.*?;\]"),
            ("html_entity_dash", r"&#82\d{2};"),
            ("nbsp_entity", r"&nbsp;"),
            ("empty_brackets", r"\s*\[\]\s*"),
            // font-resize widget rendered as text on several Thai news sites
            ("font_resizer", r"-\s*ก\s*ก\s*\+"),
            // share-bar "print" button; anchored to the widget so the ordinary
            // verb พิมพ์ in the body is never touched
            ("share_print", r"แชร์\s*:?\s*พิมพ์|พิมพ์หน้านี้"),
        ];
        let tail: &[(&str, &str)] = &[
            ("load_more", r"โหลดเพิ่ม"),
            ("view_all_photos", r"ดูทั้งหมด\s*\d+\s*ภาพ"),
            ("share_this", r"แชร์เรื่องนี้"),
            ("photo_credit", r"ขอขอบคุณ"),
            ("author_footer", r"ผู้เขียน\s*[:：]"),
            ("facebook_footer", r"Facebook"),
            ("twitter_footer", r"Twitter"),
            ("line_footer", r"LINE"),
            ("follow_social", r"ติดตามโซเชียล"),
            ("read_more", r"อ่านต่อที่"),
            ("view_photos", r"คลิกชมภาพ"),
            ("see_more", r"ดูเพิ่มเติม"),
            ("image_credit", r"เครดิตภาพ"),
            ("original_article", r"อ่านข่าวต้นฉบับ"),
            ("tags_footer", r"TAGS:"),
            ("references", r"แหล่งอ้างอิง"),
            ("partial_references", r"อ้างอิงบางส่วน:"),
            ("syndication_post", r"(?i)The post "),
            ("syndication_appeared", r"(?i)appeared first on "),
        ];
        let mut patterns = Vec::new();
        for &(name, pat) in spot {
            patterns.push(NoisePattern {
                name: name.to_string(),
                regex: Regex::new(pat).expect("builtin noise pattern"),
                action: NoiseAction::Remove,
            });
        }
        for &(name, pat) in tail {
            patterns.push(NoisePattern {
                name: name.to_string(),
                regex: Regex::new(pat).expect("builtin noise pattern"),
                action: NoiseAction::TruncateTail,
            });
        }
        Self { patterns }
    }

    /// Loads a pattern table from JSON: `[{"name", "pattern", "action"}, ...]`.
    pub fn from_json(reader: impl std::io::Read) -> Result<Self, NerError> {
        let specs: Vec<NoisePatternSpec> = serde_json::from_reader(reader)?;
        let mut patterns = Vec::with_capacity(specs.len());
        for spec in specs {
            let regex = Regex::new(&spec.pattern)
                .map_err(|e| NerError::Config(format!("pattern '{}': {e}", spec.name)))?;
            patterns.push(NoisePattern {
                name: spec.name,
                regex,
                action: spec.action,
            });
        }
        Ok(Self { patterns })
    }

    /// Applies every pattern in order.
    fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for pattern in &self.patterns {
            match pattern.action {
                NoiseAction::Remove => {
                    out = pattern.regex.replace_all(&out, " ").into_owned();
                }
                NoiseAction::TruncateTail => {
                    if let Some(m) = pattern.regex.find(&out) {
                        out.truncate(m.start());
                    }
                }
            }
        }
        out
    }
}

/// Acceptance thresholds for a normalized document. The normalizer only
/// *reports* ([`QualityReport`]); rejecting is the caller's decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityGate {
    pub min_chars: usize,
    pub min_thai_ratio: f64,
}

impl QualityGate {
    /// Final pre-labeling gate: long, clearly Thai documents only.
    pub fn strict() -> Self {
        Self {
            min_chars: 100,
            min_thai_ratio: 0.40,
        }
    }

    /// Softer gate used earlier in the pipeline, so fewer articles are thrown
    /// away before labeling has had a chance to look at them.
    pub fn soft() -> Self {
        Self {
            min_chars: 80,
            min_thai_ratio: 0.25,
        }
    }
}

/// Length and script statistics of a normalized document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityReport {
    /// Character count (not bytes).
    pub chars: usize,
    /// Fraction of characters inside the Thai Unicode block.
    pub thai_ratio: f64,
}

impl QualityReport {
    pub fn passes(&self, gate: &QualityGate) -> bool {
        self.chars >= gate.min_chars && self.thai_ratio >= gate.min_thai_ratio
    }
}

/// The text normalizer. Construct once, reuse for every document; all regexes
/// are compiled up front.
#[derive(Debug)]
pub struct Normalizer {
    rules: NoiseRules,
    html_tag: Regex,
    whitespace: Regex,
    spacing: Regex,
}

impl Normalizer {
    pub fn new(rules: NoiseRules) -> Self {
        Self {
            rules,
            html_tag: Regex::new(r"<[^>]+>").expect("html tag pattern"),
            whitespace: Regex::new(r"\s+").expect("whitespace pattern"),
            // sentence-terminal punctuation plus quotes/brackets; the period is
            // deliberately excluded because Thai abbreviations depend on it
            spacing: Regex::new(r#"([?!()"'])"#).expect("spacing pattern"),
        }
    }

    /// Canonicalizes a raw scraped document. Idempotent.
    pub fn normalize(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }
        let text = self.html_tag.replace_all(raw, " ");
        let text: String = text.chars().filter(|c| (*c as u32) <= 0xFFFF).collect();
        let text = nfc(&text);
        let text = thai_normalize(&text);
        let text = unify_quotes(&text);
        let text = self.rules.apply(&text);
        let text = self.whitespace.replace_all(text.trim(), " ");
        let text = self.spacing.replace_all(&text, " $1 ");
        self.whitespace.replace_all(text.trim(), " ").into_owned()
    }

    /// Length and Thai-script statistics for the quality gate.
    pub fn quality(&self, text: &str) -> QualityReport {
        let mut chars = 0usize;
        let mut thai = 0usize;
        for c in text.chars() {
            chars += 1;
            if ('\u{0E00}'..='\u{0E7F}').contains(&c) {
                thai += 1;
            }
        }
        QualityReport {
            chars,
            thai_ratio: if chars == 0 {
                0.0
            } else {
                thai as f64 / chars as f64
            },
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NoiseRules::builtin())
    }
}

/// Canonical composition (NFC).
fn nfc(text: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    text.nfc().collect()
}

/// Thai-specific character corrections: invisible characters, decomposed
/// sara am, and runs of duplicated combining marks (a common paste artifact
/// in scraped news bodies).
fn thai_normalize(text: &str) -> String {
    let text = text
        .replace(['\u{200b}', '\u{200c}', '\u{200d}', '\u{feff}'], "")
        .replace('\u{00a0}', " ")
        // NIKHAHIT + SARA AA → SARA AM
        .replace("\u{0e4d}\u{0e32}", "\u{0e33}");

    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if prev == Some(c) && is_thai_mark(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Combining vowels and tone marks that never legally repeat.
fn is_thai_mark(c: char) -> bool {
    matches!(c, '\u{0e31}' | '\u{0e34}'..='\u{0e3a}' | '\u{0e47}'..='\u{0e4e}')
}

fn unify_quotes(text: &str) -> String {
    text.replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}
