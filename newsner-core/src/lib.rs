//! # newsner-core — Thai News Entity Annotation Pipeline
//!
//! This crate implements the full pipeline that turns raw Thai news articles
//! into IOB training data for Named Entity Recognition. It was designed to be
//! modular and inspectable: each stage is usable on its own, and the pipeline
//! emits an event per stage so a UI can watch a document being processed.
//!
//! ## Architecture
//!
//! The system is a linear pipeline; data flows and is transformed step by step:
//!
//! 1.  **Input**: raw article text (String), usually from an RSS crawl.
//! 2.  **Normalization** ([`normalize`]): markup noise, boilerplate tails and
//!     Thai-specific artifacts (zero-width marks, decomposed sara am) are
//!     removed; quality is measured for corpus gating.
//! 3.  **Span extraction** ([`extract`]): a black-box neural tagger (behind the
//!     [`EntityTagger`] trait) plus deterministic regex rules ([`rules`])
//!     propose candidate spans over ~350-character chunks.
//! 4.  **Reconciliation** ([`reconcile`]): date-year extension, stopword and
//!     blacklist filters, per-label confidence thresholds and containment
//!     pruning produce a clean span set.
//! 5.  **Alignment** ([`align`]): word tokens (from an external segmenter
//!     behind [`WordTokenizer`]) get byte offsets, and entity spans map onto
//!     them with the half-overlap rule.
//! 6.  **Output**: an [`AnnotatedDocument`] — entities plus a repaired IOB
//!     tag sequence — persisted as JSONL or IOB by [`corpus`].
//!
//! ## Example
//!
//! ```rust
//! use newsner_core::{NewsPipeline, RuleOnlyTagger};
//!
//! // rule-only tagger: dates, times, money and percentages via regex
//! let pipeline = NewsPipeline::new(RuleOnlyTagger::new());
//!
//! let doc = pipeline.annotate("ประชุมเริ่ม 9:30 น. งบประมาณ 1,500 บาท");
//!
//! for entity in &doc.entities {
//!     println!("{} ({}) score {:.2}", entity.text, entity.label.name(), entity.score);
//! }
//! for line in doc.iob_lines() {
//!     println!("{line}");
//! }
//! ```
//!
//! ## Main Modules
//!
//! - [`pipeline`]: orchestrator connecting all stages, with event streaming.
//! - [`normalize`]: text cleaning and the quality gate.
//! - [`extract`] / [`rules`]: candidate span production.
//! - [`reconcile`]: span filtering and conflict resolution.
//! - [`align`] / [`label`]: token alignment and the IOB tag algebra.
//! - [`corpus`]: the JSONL and IOB persistence contracts.

pub mod align;
#[cfg(feature = "article")]
pub mod article;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod label;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
#[cfg(feature = "remote-tagger")]
pub mod remote;
pub mod rules;
pub mod span;
#[cfg(feature = "thai-tokenizer")]
pub mod thai;

pub use align::{align_tokens, assign_tags, SpaceTokenizer, WordTokenizer};
pub use error::{NerError, TaggerError};
pub use extract::{EntityTagger, RuleOnlyTagger, SpanExtractor, TaggerSpan};
pub use label::{repair_tags, EntityLabel, Tag};
pub use normalize::{NoiseRules, Normalizer, QualityGate, QualityReport};
pub use pipeline::{AnnotatedDocument, NewsPipeline, PipelineEvent};
pub use reconcile::Reconciler;
pub use span::{CandidateSpan, EntitySpan, SpanSource};
#[cfg(feature = "thai-tokenizer")]
pub use thai::NewmmWordTokenizer;
