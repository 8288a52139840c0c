//! # Dictionary-Based Thai Word Segmentation
//!
//! [`SpaceTokenizer`](crate::align::SpaceTokenizer) only splits on
//! whitespace, so a run of unsegmented Thai becomes one clause-sized token
//! and the aligner's half-overlap rule rejects every entity inside it. This
//! module plugs PyThaiNLP's `nlpo3` implementation of the newmm maximal
//! matching algorithm in behind [`WordTokenizer`], which is the segmenter
//! the labeled corpus was built with.
//!
//! A newmm dictionary is a plain word list, one word per line; nlpo3 ships
//! none, so deployments point at their own (PyThaiNLP's `words_th.txt`
//! works as-is).

use nlpo3::tokenizer::newmm::NewmmTokenizer;
use nlpo3::tokenizer::tokenizer_trait::Tokenizer;
use tracing::warn;

use crate::align::WordTokenizer;

/// Newmm word segmentation behind the [`WordTokenizer`] boundary.
pub struct NewmmWordTokenizer {
    inner: NewmmTokenizer,
}

impl NewmmWordTokenizer {
    /// Builds a tokenizer from a dictionary file (one word per line).
    pub fn from_dict_file(path: &str) -> Self {
        Self {
            inner: NewmmTokenizer::new(path),
        }
    }

    /// Builds a tokenizer from an in-memory word list.
    pub fn from_words(words: Vec<String>) -> Self {
        Self {
            inner: NewmmTokenizer::from_word_list(words),
        }
    }
}

impl WordTokenizer for NewmmWordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        // safe mode bounds backtracking on long dictionary-free stretches
        match self.inner.segment(text, true, false) {
            Ok(tokens) => tokens
                .into_iter()
                .filter(|t| !t.trim().is_empty())
                .collect(),
            Err(err) => {
                warn!(error = %err, "newmm segmentation failed, falling back to whitespace");
                text.split_whitespace().map(str::to_string).collect()
            }
        }
    }
}
