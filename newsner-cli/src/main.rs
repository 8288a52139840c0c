//! `newsner` — batch corpus builder for Thai news NER.
//!
//! The subcommands mirror the stages of the corpus pipeline; each one reads
//! the previous stage's JSONL file and writes the next:
//!
//! ```bash
//! newsner harvest --out data/news.jsonl
//! newsner clean   --input data/news.jsonl   --out data/cleaned.jsonl
//! newsner label   --input data/cleaned.jsonl --out data/labeled.jsonl \
//!     --tagger-url http://localhost:8000/ner
//! newsner filter  --input data/labeled.jsonl --out data/filtered.jsonl
//! newsner iob     --input data/filtered.jsonl --out data/train.iob \
//!     --dict data/words_th.txt
//! ```

mod harvest;

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use newsner_core::corpus::{
    read_jsonl, write_iob, write_jsonl, EntityRecord, LabeledRecord, NewsRecord, RawEntityRecord,
    RawLabeledRecord,
};
use newsner_core::remote::RemoteTagger;
use newsner_core::{
    align_tokens, assign_tags, repair_tags, AnnotatedDocument, EntitySpan, EntityTagger,
    NewmmWordTokenizer, NoiseRules, Normalizer, QualityGate, RuleOnlyTagger, SpaceTokenizer,
    SpanExtractor, WordTokenizer,
};

use crate::harvest::{Harvester, DEFAULT_FEEDS};

#[derive(Parser)]
#[command(name = "newsner", about = "Thai news NER corpus builder", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Harvest articles from Thai news RSS feeds into a JSONL corpus.
    Harvest {
        #[arg(long)]
        out: PathBuf,
        /// Feed URLs; the built-in Thai news list when omitted.
        #[arg(long)]
        feed: Vec<String>,
        /// Stop once this many articles are collected.
        #[arg(long, default_value_t = 1200)]
        target: usize,
    },
    /// Normalize article text and drop low-quality documents.
    Clean {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Quality gate profile.
        #[arg(long, value_enum, default_value_t = GateProfile::Strict)]
        gate: GateProfile,
        /// JSON file overriding the built-in noise pattern table.
        #[arg(long)]
        noise_rules: Option<PathBuf>,
    },
    /// Run the tagger and regex rules, producing raw labeled records.
    Label {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// HTTP NER service endpoint; regex rules only when omitted.
        #[arg(long)]
        tagger_url: Option<String>,
    },
    /// Close the label set and filter entities through the reconciler.
    Filter {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Extra stopwords, one per line, on top of the built-in list.
        #[arg(long)]
        stopwords: Option<PathBuf>,
    },
    /// Convert filtered records to IOB training data.
    Iob {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// newmm dictionary (one word per line) for Thai word segmentation;
        /// whitespace splitting when omitted.
        #[arg(long)]
        dict: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GateProfile {
    /// 100+ chars, 40%+ Thai.
    Strict,
    /// 80+ chars, 25%+ Thai.
    Soft,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match Cli::parse().command {
        Command::Harvest { out, feed, target } => cmd_harvest(out, feed, target),
        Command::Clean {
            input,
            out,
            gate,
            noise_rules,
        } => cmd_clean(input, out, gate, noise_rules),
        Command::Label {
            input,
            out,
            tagger_url,
        } => cmd_label(input, out, tagger_url),
        Command::Filter {
            input,
            out,
            stopwords,
        } => cmd_filter(input, out, stopwords),
        Command::Iob { input, out, dict } => cmd_iob(input, out, dict),
    }
}

fn cmd_harvest(out: PathBuf, feeds: Vec<String>, target: usize) -> Result<()> {
    let feeds = if feeds.is_empty() {
        DEFAULT_FEEDS.iter().map(|f| f.to_string()).collect()
    } else {
        feeds
    };

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let records = runtime.block_on(async {
        let mut harvester = Harvester::new()?;
        harvester.harvest(&feeds, target).await
    })?;

    write_jsonl(&out, &records)?;
    info!(articles = records.len(), out = %out.display(), "harvest done");
    Ok(())
}

fn cmd_clean(
    input: PathBuf,
    out: PathBuf,
    gate: GateProfile,
    noise_rules: Option<PathBuf>,
) -> Result<()> {
    let rules = match noise_rules {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("reading {}", path.display()))?;
            NoiseRules::from_json(file)?
        }
        None => NoiseRules::builtin(),
    };
    let normalizer = Normalizer::new(rules);
    let gate = match gate {
        GateProfile::Strict => QualityGate::strict(),
        GateProfile::Soft => QualityGate::soft(),
    };

    let (records, skipped): (Vec<NewsRecord>, usize) = read_jsonl(&input)?;
    let total = records.len();
    let cleaned: Vec<NewsRecord> = records
        .into_iter()
        .filter_map(|mut record| {
            record.text = normalizer.normalize(&record.text);
            normalizer
                .quality(&record.text)
                .passes(&gate)
                .then_some(record)
        })
        .collect();

    write_jsonl(&out, &cleaned)?;
    info!(
        total,
        kept = cleaned.len(),
        dropped = total - cleaned.len(),
        malformed = skipped,
        "clean done"
    );
    Ok(())
}

fn cmd_label(input: PathBuf, out: PathBuf, tagger_url: Option<String>) -> Result<()> {
    let tagger: Box<dyn EntityTagger + Send + Sync> = match tagger_url {
        Some(url) => {
            info!(%url, "labeling with remote tagger");
            Box::new(RemoteTagger::new(url)?)
        }
        None => {
            info!("no tagger url given, labeling with regex rules only");
            Box::new(RuleOnlyTagger::new())
        }
    };
    let extractor = SpanExtractor::new(tagger);

    let (records, skipped): (Vec<NewsRecord>, usize) = read_jsonl(&input)?;
    let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
    let spans_per_doc = extractor.extract_batch(&texts);

    let labeled: Vec<RawLabeledRecord> = texts
        .into_iter()
        .zip(spans_per_doc)
        .map(|(text, spans)| RawLabeledRecord {
            text,
            entities: spans
                .into_iter()
                .map(|span| RawEntityRecord {
                    entity: span.label.name().to_string(),
                    word: span.text,
                    score: span.score,
                })
                .collect(),
        })
        .collect();

    write_jsonl(&out, &labeled)?;
    info!(documents = labeled.len(), malformed = skipped, "label done");
    Ok(())
}

fn cmd_filter(input: PathBuf, out: PathBuf, stopwords: Option<PathBuf>) -> Result<()> {
    let mut reconciler = newsner_core::Reconciler::new();
    if let Some(path) = stopwords {
        let list = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut added = 0usize;
        for word in list.lines().map(str::trim).filter(|w| !w.is_empty()) {
            reconciler.add_stopword(word);
            added += 1;
        }
        info!(added, from = %path.display(), "loaded extra stopwords");
    }
    let (records, skipped): (Vec<RawLabeledRecord>, usize) = read_jsonl(&input)?;
    let total = records.len();

    let filtered: Vec<LabeledRecord> = records
        .into_iter()
        .filter_map(|raw| {
            let record = raw.narrow();
            let spans = reconciler.reconcile(&record.text, record.locate_spans());
            if spans.is_empty() {
                return None;
            }
            // one record entry per distinct (label, surface form)
            let mut seen = HashSet::new();
            let entities: Vec<EntityRecord> = spans
                .into_iter()
                .filter(|span| seen.insert((span.label, span.text.clone())))
                .map(|span| EntityRecord {
                    entity: span.label,
                    word: span.text,
                    score: span.score,
                })
                .collect();
            Some(LabeledRecord {
                text: record.text,
                entities,
            })
        })
        .collect();

    write_jsonl(&out, &filtered)?;
    info!(
        total,
        kept = filtered.len(),
        dropped = total - filtered.len(),
        malformed = skipped,
        "filter done"
    );
    Ok(())
}

fn cmd_iob(input: PathBuf, out: PathBuf, dict: Option<PathBuf>) -> Result<()> {
    let tokenizer: Box<dyn WordTokenizer> = match dict {
        Some(path) => {
            info!(dict = %path.display(), "segmenting with newmm");
            Box::new(NewmmWordTokenizer::from_dict_file(&path.to_string_lossy()))
        }
        None => Box::new(SpaceTokenizer),
    };
    let (records, skipped): (Vec<LabeledRecord>, usize) = read_jsonl(&input)?;

    let documents: Vec<AnnotatedDocument> = records
        .into_iter()
        .map(|record| {
            let entities: Vec<EntitySpan> = record
                .locate_spans()
                .into_iter()
                .map(|c| EntitySpan {
                    start: c.start,
                    end: c.end,
                    label: c.label,
                    text: c.text,
                    score: c.score,
                })
                .collect();
            let tokens = tokenizer.tokenize(&record.text);
            let token_spans = align_tokens(&record.text, &tokens);
            let tags = repair_tags(&assign_tags(&token_spans, &entities));
            AnnotatedDocument {
                text: record.text,
                entities,
                tokens,
                tags,
            }
        })
        .collect();

    let writer = BufWriter::new(File::create(&out).with_context(|| format!("creating {}", out.display()))?);
    write_iob(writer, &documents)?;

    let tokens: usize = documents.iter().map(|d| d.tokens.len()).sum();
    info!(
        documents = documents.len(),
        tokens,
        malformed = skipped,
        out = %out.display(),
        "iob export done"
    );
    Ok(())
}
