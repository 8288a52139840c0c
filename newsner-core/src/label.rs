//! # Entity Labels and IOB Tag Scheme
//!
//! Defines the closed set of entity categories produced by the labeling pipeline
//! and the **IOB** (Inside-Outside-Begin) annotation scheme used to tag tokens.
//!
//! ## Entity Categories
//!
//! | Label        | Meaning                  | Examples                         |
//! |--------------|--------------------------|----------------------------------|
//! | PERSON       | Named individual         | สมชาย ใจดี, ประยุทธ์             |
//! | ORGANIZATION | Company, agency, office  | กระทรวงสาธารณสุข, ปตท.           |
//! | LOCATION     | Place, region, country   | กรุงเทพฯ, เชียงใหม่, ญี่ปุ่น        |
//! | DATE         | Calendar expression      | 15 ธ.ค. 67, พ.ศ. 2567            |
//! | TIME         | Clock time               | 9:30 น., 18:00                   |
//! | MONEY        | Monetary amount          | 500 บาท, 1,200 USD               |
//! | PERCENT      | Percentage               | 3.5%                             |
//! | LAW          | Statute or regulation    | พ.ร.บ.คอมพิวเตอร์                 |
//!
//! ## IOB Scheme
//!
//! - `B-LABEL`: first token of an entity
//! - `I-LABEL`: continuation token of the same entity
//! - `O`: token outside any entity
//!
//! An `I-LABEL` tag is only legal directly after a `B-LABEL` or `I-LABEL` of the
//! same label. [`repair_tags`] enforces this by promoting orphaned inside-tags.

use serde::{Deserialize, Serialize};

/// The closed set of entity categories.
///
/// The upstream tagger reports categories as free-form strings; anything that does
/// not parse into this enumeration is dropped during reconciliation, so invalid
/// labels can never reach the training corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Person,
    Organization,
    Location,
    Date,
    Time,
    Money,
    Percent,
    Law,
}

impl EntityLabel {
    /// All labels in a fixed order (for iteration and stable output).
    pub const ALL: [EntityLabel; 8] = [
        EntityLabel::Person,
        EntityLabel::Organization,
        EntityLabel::Location,
        EntityLabel::Date,
        EntityLabel::Time,
        EntityLabel::Money,
        EntityLabel::Percent,
        EntityLabel::Law,
    ];

    /// Canonical name as used in the corpus files (e.g. "PERSON").
    pub fn name(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Organization => "ORGANIZATION",
            EntityLabel::Location => "LOCATION",
            EntityLabel::Date => "DATE",
            EntityLabel::Time => "TIME",
            EntityLabel::Money => "MONEY",
            EntityLabel::Percent => "PERCENT",
            EntityLabel::Law => "LAW",
        }
    }

    /// Parses a label name, case-insensitively. Returns `None` for anything
    /// outside the valid label set.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PERSON" => Some(EntityLabel::Person),
            "ORGANIZATION" => Some(EntityLabel::Organization),
            "LOCATION" => Some(EntityLabel::Location),
            "DATE" => Some(EntityLabel::Date),
            "TIME" => Some(EntityLabel::Time),
            "MONEY" => Some(EntityLabel::Money),
            "PERCENT" => Some(EntityLabel::Percent),
            "LAW" => Some(EntityLabel::Law),
            _ => None,
        }
    }

    /// Minimum confidence for a span of this label to survive reconciliation.
    ///
    /// Name-like categories need a stricter score than the pattern-like ones,
    /// which mostly come from regex rules at score 1.0 anyway.
    pub fn min_confidence(&self) -> f64 {
        match self {
            EntityLabel::Person | EntityLabel::Location | EntityLabel::Organization => 0.80,
            EntityLabel::Date
            | EntityLabel::Time
            | EntityLabel::Money
            | EntityLabel::Percent
            | EntityLabel::Law => 0.70,
        }
    }

    /// Highlight color used by the web front-end.
    pub fn color(&self) -> &'static str {
        match self {
            EntityLabel::Person => "#b3d9ff",
            EntityLabel::Organization => "#ffd1b3",
            EntityLabel::Location => "#c2f0c2",
            EntityLabel::Date => "#ffe680",
            EntityLabel::Time => "#ffd6e7",
            EntityLabel::Money => "#e6ccff",
            EntityLabel::Percent => "#e0ffff",
            EntityLabel::Law => "#dddddd",
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// IOB tag attached to one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tag {
    /// First token of an entity.
    Begin(EntityLabel),
    /// Continuation token of an entity.
    Inside(EntityLabel),
    /// Not part of any entity.
    Outside,
}

impl Tag {
    /// Textual form written to the training file (e.g. "B-PERSON", "O").
    pub fn label(&self) -> String {
        match self {
            Tag::Begin(l) => format!("B-{}", l.name()),
            Tag::Inside(l) => format!("I-{}", l.name()),
            Tag::Outside => "O".to_string(),
        }
    }

    /// Parses the textual form back (e.g. "I-MONEY" → `Inside(Money)`).
    pub fn from_label(s: &str) -> Option<Self> {
        if s == "O" {
            return Some(Tag::Outside);
        }
        let (prefix, name) = s.split_once('-')?;
        let label = EntityLabel::parse(name)?;
        match prefix {
            "B" => Some(Tag::Begin(label)),
            "I" => Some(Tag::Inside(label)),
            _ => None,
        }
    }

    /// The entity label carried by this tag, if any.
    pub fn entity(&self) -> Option<EntityLabel> {
        match self {
            Tag::Begin(l) | Tag::Inside(l) => Some(*l),
            Tag::Outside => None,
        }
    }

    /// Whether `prev → next` is a legal IOB transition.
    ///
    /// `I-X` may only follow `B-X` or `I-X` of the same label; `B-X` and `O`
    /// may follow anything.
    pub fn is_valid_transition(prev: &Tag, next: &Tag) -> bool {
        match next {
            Tag::Inside(label) => matches!(prev, Tag::Begin(p) | Tag::Inside(p) if p == label),
            _ => true,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Repairs a tag sequence so that it contains no orphaned inside-tags.
///
/// Single forward pass tracking only the previous tag: an `I-X` whose
/// predecessor is `O` or carries a different label is promoted to `B-X`;
/// everything else passes through unchanged. The output always satisfies
/// the IOB legality invariant, for any input.
///
/// # Example
/// `[O, I-PERSON, I-PERSON, I-DATE]` → `[O, B-PERSON, I-PERSON, B-DATE]`
pub fn repair_tags(tags: &[Tag]) -> Vec<Tag> {
    let mut fixed = Vec::with_capacity(tags.len());
    let mut prev = Tag::Outside;
    for tag in tags {
        let next = match tag {
            Tag::Inside(label) if !Tag::is_valid_transition(&prev, tag) => Tag::Begin(*label),
            other => *other,
        };
        fixed.push(next);
        prev = next;
    }
    fixed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse_roundtrip() {
        for label in EntityLabel::ALL {
            assert_eq!(EntityLabel::parse(label.name()), Some(label));
        }
        assert_eq!(EntityLabel::parse("person"), Some(EntityLabel::Person));
        assert_eq!(EntityLabel::parse("MISC"), None);
        assert_eq!(EntityLabel::parse(""), None);
    }

    #[test]
    fn test_tag_labels() {
        assert_eq!(Tag::Outside.label(), "O");
        assert_eq!(Tag::Begin(EntityLabel::Person).label(), "B-PERSON");
        assert_eq!(Tag::Inside(EntityLabel::Money).label(), "I-MONEY");
        assert_eq!(Tag::from_label("B-DATE"), Some(Tag::Begin(EntityLabel::Date)));
        assert_eq!(Tag::from_label("I-LAW"), Some(Tag::Inside(EntityLabel::Law)));
        assert_eq!(Tag::from_label("X-LAW"), None);
    }

    #[test]
    fn test_valid_transitions() {
        let b_per = Tag::Begin(EntityLabel::Person);
        let i_per = Tag::Inside(EntityLabel::Person);
        let i_loc = Tag::Inside(EntityLabel::Location);
        assert!(Tag::is_valid_transition(&b_per, &i_per));
        assert!(Tag::is_valid_transition(&i_per, &i_per));
        assert!(!Tag::is_valid_transition(&Tag::Outside, &i_per));
        assert!(!Tag::is_valid_transition(&b_per, &i_loc));
    }

    #[test]
    fn test_repair_promotes_orphans() {
        let input = vec![
            Tag::Outside,
            Tag::Inside(EntityLabel::Person),
            Tag::Inside(EntityLabel::Person),
            Tag::Inside(EntityLabel::Date),
        ];
        let fixed = repair_tags(&input);
        assert_eq!(fixed[1], Tag::Begin(EntityLabel::Person));
        assert_eq!(fixed[2], Tag::Inside(EntityLabel::Person));
        assert_eq!(fixed[3], Tag::Begin(EntityLabel::Date));
    }

    #[test]
    fn test_repair_output_is_always_legal() {
        let input = vec![
            Tag::Inside(EntityLabel::Money),
            Tag::Begin(EntityLabel::Money),
            Tag::Inside(EntityLabel::Money),
            Tag::Outside,
            Tag::Inside(EntityLabel::Law),
        ];
        let fixed = repair_tags(&input);
        let mut prev = Tag::Outside;
        for tag in &fixed {
            assert!(Tag::is_valid_transition(&prev, tag), "illegal {prev} → {tag}");
            prev = *tag;
        }
    }

    #[test]
    fn test_repair_keeps_legal_sequences() {
        let input = vec![
            Tag::Begin(EntityLabel::Location),
            Tag::Inside(EntityLabel::Location),
            Tag::Outside,
        ];
        assert_eq!(repair_tags(&input), input);
    }
}
