//! Article summaries for the result card.

use newsner_core::extract::split_sentences;

/// Summary strategy boundary. Only the lead-based strategy ships; an
/// abstractive one would plug in here.
pub trait Summarizer {
    fn summarize(&self, text: &str, max_sentences: usize) -> String;
}

/// Takes the first `max_sentences` sentences of the article. News leads
/// front-load who/what/where, which makes this a strong baseline for Thai
/// news text.
pub struct LeadSummarizer;

impl Summarizer for LeadSummarizer {
    fn summarize(&self, text: &str, max_sentences: usize) -> String {
        let lead: Vec<&str> = split_sentences(text)
            .into_iter()
            .take(max_sentences)
            .map(|(_, sentence)| sentence.trim())
            .filter(|s| !s.is_empty())
            .collect();
        lead.join(" ")
    }
}
