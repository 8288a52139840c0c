//! # Regex Rule Battery
//!
//! Pattern-expressible labels (DATE, TIME, PERCENT, MONEY) are extracted by
//! fixed regex rules over the whole document, independently of the neural
//! tagger. Rules are high-precision by construction, so every match is emitted
//! at confidence 1.0 with its rule name as provenance.
//!
//! The date pattern covers both Thai month abbreviations (ม.ค. … ธ.ค.) and the
//! full month names, an optional 2–4 digit year, and explicit Buddhist-era
//! (พ.ศ.) / Common-era (ค.ศ.) year markers.

use regex::Regex;

use crate::label::EntityLabel;
use crate::span::{CandidateSpan, SpanSource};

/// One compiled rule: label + pattern + name.
struct Rule {
    name: &'static str,
    label: EntityLabel,
    regex: Regex,
}

/// The fixed rule battery. Compile once, apply per document.
pub struct RegexRules {
    rules: Vec<Rule>,
}

impl RegexRules {
    pub fn new() -> Self {
        let rules = vec![
            Rule {
                name: "date",
                label: EntityLabel::Date,
                regex: Regex::new(
                    r"(?:\d{1,2}\s?(?:ม\.ค\.|ก\.พ\.|มี\.ค\.|เม\.ย\.|พ\.ค\.|มิ\.ย\.|ก\.ค\.|ส\.ค\.|ก\.ย\.|ต\.ค\.|พ\.ย\.|ธ\.ค\.|มกราคม|กุมภาพันธ์|มีนาคม|เมษายน|พฤษภาคม|มิถุนายน|กรกฎาคม|สิงหาคม|กันยายน|ตุลาคม|พฤศจิกายน|ธันวาคม)(?:\s?\d{2,4})?|พ\.ศ\.\s?\d{4}|ค\.ศ\.\s?\d{4})",
                )
                .expect("date pattern"),
            },
            Rule {
                name: "time",
                label: EntityLabel::Time,
                regex: Regex::new(r"\d{1,2}:\d{2}\s?(?:น\.|[ap]m|[AP]M)?").expect("time pattern"),
            },
            Rule {
                name: "percent",
                label: EntityLabel::Percent,
                regex: Regex::new(r"\d+(?:\.\d+)?%").expect("percent pattern"),
            },
            Rule {
                name: "money",
                label: EntityLabel::Money,
                regex: Regex::new(r"\d{1,3}(?:,\d{3})*(?:\.\d+)?\s?(?:บาท|ดอลลาร์|USD|THB)")
                    .expect("money pattern"),
            },
        ];
        Self { rules }
    }

    /// Runs every rule over the whole document. Offsets are document-global.
    pub fn apply(&self, text: &str) -> Vec<CandidateSpan> {
        let mut out = Vec::new();
        for rule in &self.rules {
            for m in rule.regex.find_iter(text) {
                out.push(CandidateSpan {
                    start: m.start(),
                    end: m.end(),
                    label: rule.label,
                    text: m.as_str().to_string(),
                    score: 1.0,
                    source: SpanSource::Rule(rule.name),
                });
            }
        }
        out
    }
}

impl Default for RegexRules {
    fn default() -> Self {
        Self::new()
    }
}
