//! # Annotation Pipeline — Orchestrator with Observable Events
//!
//! The pipeline wires all the stages together (normalizer, span extractor,
//! reconciler, token aligner, IOB assembler) and emits an event after each
//! step through a Rust channel (`mpsc`), so the WebSocket server can stream
//! progress to the client in real time.
//!
//! ## Stages
//!
//! | # | Stage | Module | Event |
//! |---|-------|--------|-------|
//! | 1 | Normalize raw text | [`crate::normalize`] | `Normalized` |
//! | 2 | Extract candidate spans | [`crate::extract`] | `SpansExtracted` |
//! | 3 | Reconcile and filter | [`crate::reconcile`] | `SpansReconciled` |
//! | 4 | Tokenize and align | [`crate::align`] | `TokensAligned` |
//! | 5 | Assign + repair IOB tags | [`crate::label`] | `TagAssigned` (per token) |
//! | 6 | Done | — | `Done` |
//!
//! # Usage Modes
//! - **Sync**: [`NewsPipeline::annotate`] for scripts and batch jobs.
//! - **Streaming**: [`NewsPipeline::annotate_streaming`] for reactive UIs.
//! - **Batch**: [`NewsPipeline::annotate_batch`] spreads documents over a
//!   rayon thread pool (documents are independent, so this is embarrassingly
//!   parallel).

use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::align::{align_tokens, assign_tags, SpaceTokenizer, WordTokenizer};
use crate::extract::{EntityTagger, SpanExtractor};
use crate::label::{repair_tags, Tag};
use crate::normalize::{NoiseRules, Normalizer};
use crate::reconcile::Reconciler;
use crate::span::EntitySpan;

/// Events emitted by the pipeline while a document is processed.
///
/// Each variant carries what the frontend needs to render that step of the
/// visualization. Serialized as `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Step 1**: Normalization done. Carries the cleaned text plus the
    /// quality measurements used by corpus gating.
    Normalized {
        text: String,
        chars: usize,
        thai_ratio: f64,
    },
    /// **Step 2**: Candidate spans from the tagger and the regex rules,
    /// before any filtering.
    SpansExtracted {
        spans: Vec<EntitySpan>,
        total: usize,
    },
    /// **Step 3**: Spans that survived reconciliation. `dropped` counts the
    /// candidates removed by thresholds, stopwords and containment pruning.
    SpansReconciled {
        entities: Vec<EntitySpan>,
        dropped: usize,
    },
    /// **Step 4**: Word tokens with their recovered byte offsets.
    TokensAligned {
        tokens: Vec<String>,
        total: usize,
    },
    /// **Step 5**: Final (repaired) tag for one token.
    TagAssigned {
        token_index: usize,
        token_text: String,
        tag: String,
    },
    /// **Conclusion**: the whole annotated document with timing.
    Done {
        document: AnnotatedDocument,
        processing_ms: u64,
    },
    /// **Failure**: an unrecoverable error. The pipeline itself degrades
    /// instead of failing; this variant is emitted by outer layers (e.g. a
    /// URL fetch in the web server) that share the same event stream.
    Error { message: String },
}

/// The end product of the pipeline: text, entity spans and the IOB view.
///
/// Invariant: `tokens.len() == tags.len()`, and `tags` is always a legal
/// IOB sequence (no orphaned `I-` tags).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    /// Normalized text the offsets refer to.
    pub text: String,
    pub entities: Vec<EntitySpan>,
    pub tokens: Vec<String>,
    pub tags: Vec<Tag>,
}

impl AnnotatedDocument {
    /// Renders the document as IOB training lines, one `token<TAB>tag` per
    /// token. The caller adds the blank separator line between documents.
    pub fn iob_lines(&self) -> Vec<String> {
        self.tokens
            .iter()
            .zip(&self.tags)
            .map(|(token, tag)| format!("{}\t{}", token, tag.label()))
            .collect()
    }
}

/// The main annotation pipeline.
///
/// Acts as the **controller** of the system, orchestrating:
/// 1. Normalization of the raw article text.
/// 2. Candidate span extraction (tagger + regex rules).
/// 3. Reconciliation into a clean, non-overlapping span set.
/// 4. Word tokenization and offset alignment.
/// 5. IOB tag assignment and repair.
pub struct NewsPipeline<T: EntityTagger> {
    pub normalizer: Normalizer,
    pub extractor: SpanExtractor<T>,
    pub reconciler: Reconciler,
    tokenizer: Box<dyn WordTokenizer>,
}

impl<T: EntityTagger> NewsPipeline<T> {
    /// Builds a pipeline around `tagger` with built-in noise rules, the
    /// default reconciler lexicons and whitespace tokenization.
    pub fn new(tagger: T) -> Self {
        Self {
            normalizer: Normalizer::new(NoiseRules::builtin()),
            extractor: SpanExtractor::new(tagger),
            reconciler: Reconciler::new(),
            tokenizer: Box::new(SpaceTokenizer),
        }
    }

    /// Swaps in a real word segmenter (e.g. a newmm binding) in place of the
    /// whitespace default.
    pub fn with_tokenizer(mut self, tokenizer: Box<dyn WordTokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Processes one document synchronously and returns the final result.
    pub fn annotate(&self, text: &str) -> AnnotatedDocument {
        let (tx, rx) = mpsc::channel();
        self.annotate_streaming(text, tx);

        let mut result = AnnotatedDocument {
            text: String::new(),
            entities: vec![],
            tokens: vec![],
            tags: vec![],
        };
        // drain all events, keep the final document
        while let Ok(event) = rx.recv() {
            if let PipelineEvent::Done { document, .. } = event {
                result = document;
            }
        }
        result
    }

    /// Runs the pipeline pushing progress events through `tx`.
    ///
    /// This method is the heart of the visual interface. It returns nothing
    /// directly; the final document travels inside the `Done` event.
    pub fn annotate_streaming(&self, text: &str, tx: mpsc::Sender<PipelineEvent>) {
        let start = std::time::Instant::now();

        // === Step 1: Normalization ===
        let text = self.normalizer.normalize(text);
        let quality = self.normalizer.quality(&text);
        let _ = tx.send(PipelineEvent::Normalized {
            text: text.clone(),
            chars: quality.chars,
            thai_ratio: quality.thai_ratio,
        });

        if text.is_empty() {
            let _ = tx.send(PipelineEvent::Done {
                document: AnnotatedDocument {
                    text,
                    entities: vec![],
                    tokens: vec![],
                    tags: vec![],
                },
                processing_ms: start.elapsed().as_millis() as u64,
            });
            return;
        }

        // === Step 2: Candidate extraction ===
        let candidates = self.extractor.extract(&text);
        let total = candidates.len();
        let _ = tx.send(PipelineEvent::SpansExtracted {
            spans: candidates
                .iter()
                .map(|c| EntitySpan {
                    start: c.start,
                    end: c.end,
                    label: c.label,
                    text: c.text.clone(),
                    score: c.score,
                })
                .collect(),
            total,
        });

        // === Step 3: Reconciliation ===
        let entities = self.reconciler.reconcile(&text, candidates);
        let _ = tx.send(PipelineEvent::SpansReconciled {
            entities: entities.clone(),
            dropped: total - entities.len().min(total),
        });

        // === Step 4: Tokenization and alignment ===
        let tokens = self.tokenizer.tokenize(&text);
        let token_spans = align_tokens(&text, &tokens);
        let _ = tx.send(PipelineEvent::TokensAligned {
            tokens: tokens.clone(),
            total: tokens.len(),
        });

        // === Step 5: IOB assignment + repair ===
        let tags = repair_tags(&assign_tags(&token_spans, &entities));
        for (i, (token, tag)) in tokens.iter().zip(&tags).enumerate() {
            let _ = tx.send(PipelineEvent::TagAssigned {
                token_index: i,
                token_text: token.clone(),
                tag: tag.label(),
            });
        }

        let _ = tx.send(PipelineEvent::Done {
            document: AnnotatedDocument {
                text,
                entities,
                tokens,
                tags,
            },
            processing_ms: start.elapsed().as_millis() as u64,
        });
    }

    /// Annotates many documents on the rayon thread pool.
    pub fn annotate_batch(&self, texts: &[String]) -> Vec<AnnotatedDocument>
    where
        T: Sync,
    {
        use rayon::prelude::*;
        texts.par_iter().map(|text| self.annotate(text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaggerError;
    use crate::extract::{EntityTagger, RuleOnlyTagger, TaggerSpan};
    use crate::label::EntityLabel;

    /// Stands in for the neural tagger: returns fixed predictions whenever
    /// their surface form occurs in the chunk.
    struct MockTagger {
        predictions: Vec<(&'static str, &'static str, f64)>,
    }

    impl EntityTagger for MockTagger {
        fn tag(&self, chunk: &str) -> Result<Vec<TaggerSpan>, TaggerError> {
            Ok(self
                .predictions
                .iter()
                .filter(|(word, _, _)| chunk.contains(word))
                .map(|(word, group, score)| TaggerSpan {
                    word: word.to_string(),
                    entity_group: group.to_string(),
                    score: *score,
                    start: 0,
                    end: 0,
                })
                .collect())
        }
    }

    /// Mimics a dictionary segmenter over the sentence used in the
    /// end-to-end test. Whitespace between tokens is consumed, and the fused
    /// "นายสมชาย" / "เดินทางไปกรุงเทพฯ" clusters are split at word borders.
    struct MockThaiTokenizer;

    impl WordTokenizer for MockThaiTokenizer {
        fn tokenize(&self, text: &str) -> Vec<String> {
            let words = [
                "นาย", "สมชาย", "ใจดี", "เดินทาง", "ไป", "กรุงเทพฯ", "เมื่อ", "วันที่",
                "1", "ม.ค.", "2567", "ด้วย", "เงิน", "500", "บาท",
            ];
            let mut out = vec![];
            let mut rest = text;
            'outer: while !rest.is_empty() {
                rest = rest.trim_start();
                for word in words {
                    if rest.starts_with(word) {
                        out.push(word.to_string());
                        rest = &rest[word.len()..];
                        continue 'outer;
                    }
                }
                // unknown prefix: emit up to the next space as one token
                let cut = rest.find(' ').unwrap_or(rest.len());
                out.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            out
        }
    }

    fn tag_for<'a>(doc: &'a AnnotatedDocument, token: &str) -> &'a Tag {
        let i = doc.tokens.iter().position(|t| t == token).unwrap();
        &doc.tags[i]
    }

    #[test]
    fn test_empty_text_yields_empty_document() {
        let pipeline = NewsPipeline::new(RuleOnlyTagger::new());
        let doc = pipeline.annotate("   \n  ");
        assert!(doc.entities.is_empty());
        assert!(doc.tokens.is_empty());
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn test_end_to_end_thai_sentence() {
        let pipeline = NewsPipeline::new(MockTagger {
            predictions: vec![
                ("สมชาย ใจดี", "PERSON", 0.91),
                ("กรุงเทพฯ", "LOCATION", 0.88),
            ],
        })
        .with_tokenizer(Box::new(MockThaiTokenizer));

        let text = "นายสมชาย ใจดี เดินทางไปกรุงเทพฯ เมื่อวันที่ 1 ม.ค. 2567 ด้วยเงิน 500 บาท";
        let doc = pipeline.annotate(text);

        let labels: Vec<EntityLabel> = doc.entities.iter().map(|e| e.label).collect();
        assert!(labels.contains(&EntityLabel::Person));
        assert!(labels.contains(&EntityLabel::Location));
        assert!(labels.contains(&EntityLabel::Date));
        assert!(labels.contains(&EntityLabel::Money));

        assert_eq!(*tag_for(&doc, "สมชาย"), Tag::Begin(EntityLabel::Person));
        assert_eq!(*tag_for(&doc, "ใจดี"), Tag::Inside(EntityLabel::Person));
        assert_eq!(*tag_for(&doc, "กรุงเทพฯ"), Tag::Begin(EntityLabel::Location));
        assert_eq!(*tag_for(&doc, "1"), Tag::Begin(EntityLabel::Date));
        assert_eq!(*tag_for(&doc, "ม.ค."), Tag::Inside(EntityLabel::Date));
        assert_eq!(*tag_for(&doc, "2567"), Tag::Inside(EntityLabel::Date));
        assert_eq!(*tag_for(&doc, "500"), Tag::Begin(EntityLabel::Money));
        assert_eq!(*tag_for(&doc, "บาท"), Tag::Inside(EntityLabel::Money));
        assert_eq!(*tag_for(&doc, "เดินทาง"), Tag::Outside);
    }

    #[test]
    fn test_streaming_event_order() {
        let pipeline = NewsPipeline::new(RuleOnlyTagger::new());
        let (tx, rx) = mpsc::channel();
        pipeline.annotate_streaming("ประชุมเริ่ม 9:30 น. ที่ทำเนียบ", tx);

        let events: Vec<PipelineEvent> = rx.iter().collect();
        assert!(matches!(events.first(), Some(PipelineEvent::Normalized { .. })));
        assert!(matches!(events.last(), Some(PipelineEvent::Done { .. })));
        let extracted = events
            .iter()
            .position(|e| matches!(e, PipelineEvent::SpansExtracted { .. }))
            .unwrap();
        let reconciled = events
            .iter()
            .position(|e| matches!(e, PipelineEvent::SpansReconciled { .. }))
            .unwrap();
        assert!(extracted < reconciled);
    }

    #[test]
    fn test_iob_lines_format() {
        let doc = AnnotatedDocument {
            text: "สมชาย ไป".to_string(),
            entities: vec![],
            tokens: vec!["สมชาย".to_string(), "ไป".to_string()],
            tags: vec![Tag::Begin(EntityLabel::Person), Tag::Outside],
        };
        assert_eq!(doc.iob_lines(), vec!["สมชาย\tB-PERSON", "ไป\tO"]);
    }

    #[test]
    fn test_batch_matches_single() {
        let pipeline = NewsPipeline::new(RuleOnlyTagger::new());
        let texts = vec![
            "งบประมาณเพิ่มขึ้น 12.5% ในปีนี้".to_string(),
            "ค่าใช้จ่ายรวม 1,200 บาท ต่อเดือน".to_string(),
        ];
        let batch = pipeline.annotate_batch(&texts);
        assert_eq!(batch.len(), 2);
        for (text, doc) in texts.iter().zip(&batch) {
            let single = pipeline.annotate(text);
            assert_eq!(single.entities, doc.entities);
            assert_eq!(single.tags, doc.tags);
        }
    }
}
