//! # Corpus I/O — JSONL and IOB Contracts
//!
//! Every stage of the batch pipeline reads and writes JSON Lines: one JSON
//! object per line, UTF-8, no enclosing array. The formats are:
//!
//! | Stage | Record | Shape |
//! |-------|--------|-------|
//! | harvest | [`NewsRecord`] | `{"title", "link", "source", "text"}` |
//! | label | [`RawLabeledRecord`] | `{"text", "entities": [{"entity", "word", "score"}]}` |
//! | filter | [`LabeledRecord`] | same shape, label set closed |
//! | iob | plain text | `token<TAB>tag` lines, blank line between documents |
//!
//! Raw records keep the entity label as a free string because the upstream
//! tagger may emit anything (`MISC`, `B-PER`, lowercase variants); the closed
//! [`EntityLabel`] set is enforced when a raw record is narrowed.
//!
//! A malformed line never aborts a batch run: [`read_jsonl`] skips it,
//! counts it and logs a warning, because one broken article out of fifty
//! thousand should not cost the night's crawl.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::NerError;
use crate::label::EntityLabel;
use crate::pipeline::AnnotatedDocument;
use crate::span::{CandidateSpan, SpanSource};

/// One harvested article, as produced by the RSS crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsRecord {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub text: String,
}

/// An entity as the upstream tagger reported it. The label is still an open
/// string and the offsets may be missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntityRecord {
    pub entity: String,
    pub word: String,
    pub score: f64,
}

/// A labeled document before the label set has been closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLabeledRecord {
    pub text: String,
    pub entities: Vec<RawEntityRecord>,
}

impl RawLabeledRecord {
    /// Narrows the open label strings to the closed set, dropping entities
    /// whose label does not parse.
    pub fn narrow(self) -> LabeledRecord {
        let entities = self
            .entities
            .into_iter()
            .filter_map(|e| {
                let label = EntityLabel::parse(&e.entity)?;
                Some(EntityRecord {
                    entity: label,
                    word: e.word,
                    score: e.score,
                })
            })
            .collect();
        LabeledRecord {
            text: self.text,
            entities,
        }
    }
}

/// An entity whose label belongs to the closed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity: EntityLabel,
    pub word: String,
    pub score: f64,
}

/// A cleaned labeled document, the unit the IOB converter consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub text: String,
    pub entities: Vec<EntityRecord>,
}

impl LabeledRecord {
    /// Recovers byte offsets for the stored surface forms.
    ///
    /// The JSONL contract carries `word` strings, not offsets, so every
    /// occurrence of each word is turned into a candidate span. An entity
    /// whose surface form no longer occurs in the text (normalization drift
    /// between stages) contributes nothing.
    pub fn locate_spans(&self) -> Vec<CandidateSpan> {
        let mut spans = vec![];
        for entity in &self.entities {
            if entity.word.is_empty() {
                continue;
            }
            let mut from = 0usize;
            while let Some(pos) = self.text[from..].find(&entity.word) {
                let start = from + pos;
                let end = start + entity.word.len();
                spans.push(CandidateSpan {
                    start,
                    end,
                    label: entity.entity,
                    text: entity.word.clone(),
                    score: entity.score,
                    source: SpanSource::Model,
                });
                from = end;
            }
        }
        spans
    }
}

/// Reads a JSONL file, returning the parsed records and the number of lines
/// skipped because they were blank or malformed.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, usize), NerError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = vec![];
    let mut skipped = 0usize;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(err) => {
                skipped += 1;
                warn!(line = lineno + 1, %err, "skipping malformed JSONL line");
            }
        }
    }
    Ok((records, skipped))
}

/// Writes records as JSONL, one object per line.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<(), NerError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes annotated documents in IOB format: `token<TAB>tag` per line, a
/// blank line between documents, trailing newline at the end.
pub fn write_iob<W: Write>(mut writer: W, documents: &[AnnotatedDocument]) -> Result<(), NerError> {
    for (i, document) in documents.iter().enumerate() {
        if i > 0 {
            writer.write_all(b"\n")?;
        }
        for line in document.iob_lines() {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Tag;

    #[test]
    fn test_narrow_drops_unknown_labels() {
        let raw = RawLabeledRecord {
            text: "นายสมชายพบปะสื่อ".to_string(),
            entities: vec![
                RawEntityRecord {
                    entity: "PERSON".to_string(),
                    word: "สมชาย".to_string(),
                    score: 0.9,
                },
                RawEntityRecord {
                    entity: "MISC".to_string(),
                    word: "สื่อ".to_string(),
                    score: 0.9,
                },
            ],
        };
        let record = raw.narrow();
        assert_eq!(record.entities.len(), 1);
        assert_eq!(record.entities[0].entity, EntityLabel::Person);
    }

    #[test]
    fn test_locate_spans_finds_all_occurrences() {
        let record = LabeledRecord {
            text: "สมชายพบสมชาย".to_string(),
            entities: vec![EntityRecord {
                entity: EntityLabel::Person,
                word: "สมชาย".to_string(),
                score: 0.95,
            }],
        };
        let spans = record.locate_spans();
        assert_eq!(spans.len(), 2);
        for span in &spans {
            assert_eq!(&record.text[span.start..span.end], "สมชาย");
        }
        assert!(spans[0].end <= spans[1].start);
    }

    #[test]
    fn test_locate_spans_missing_word_contributes_nothing() {
        let record = LabeledRecord {
            text: "ไม่มีชื่อนี้".to_string(),
            entities: vec![EntityRecord {
                entity: EntityLabel::Person,
                word: "สมหญิง".to_string(),
                score: 0.95,
            }],
        };
        assert!(record.locate_spans().is_empty());
    }

    #[test]
    fn test_jsonl_roundtrip_skips_malformed() {
        let dir = std::env::temp_dir().join("newsner-corpus-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("records.jsonl");

        let records = vec![
            NewsRecord {
                title: "ข่าวหนึ่ง".to_string(),
                link: Some("https://example.com/1".to_string()),
                source: Some("feed".to_string()),
                text: "เนื้อหา".to_string(),
            },
            NewsRecord {
                title: "ข่าวสอง".to_string(),
                link: None,
                source: None,
                text: "เนื้อหาอีก".to_string(),
            },
        ];
        write_jsonl(&path, &records).unwrap();

        // corrupt the file with a broken line in the middle
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{not json}\n");
        std::fs::write(&path, content).unwrap();

        let (parsed, skipped): (Vec<NewsRecord>, usize) = read_jsonl(&path).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(skipped, 1);
        assert_eq!(parsed[0].title, "ข่าวหนึ่ง");
    }

    #[test]
    fn test_write_iob_blank_line_between_documents() {
        let doc = |tokens: &[&str], tags: Vec<Tag>| AnnotatedDocument {
            text: tokens.join(" "),
            entities: vec![],
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            tags,
        };
        let documents = vec![
            doc(&["สมชาย"], vec![Tag::Begin(EntityLabel::Person)]),
            doc(&["ไป"], vec![Tag::Outside]),
        ];
        let mut buffer = vec![];
        write_iob(&mut buffer, &documents).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "สมชาย\tB-PERSON\n\nไป\tO\n"
        );
    }
}
