//! # Remote Tagger Client
//!
//! [`EntityTagger`] backed by an HTTP inference service (typically a hosted
//! transformer NER model). The wire contract is deliberately small:
//!
//! ```text
//! POST {url}  {"text": "<chunk>"}
//! 200 OK      [{"entity_group": "PERSON", "word": "...", "score": 0.93}, ...]
//! ```
//!
//! The client is blocking on purpose: the extractor calls it from rayon
//! worker threads, and the pipeline treats a failed chunk as degradable
//! (regex rules still run), so there is nothing to gain from async here.

use std::time::Duration;

use crate::error::TaggerError;
use crate::extract::{EntityTagger, TaggerSpan};

pub struct RemoteTagger {
    client: reqwest::blocking::Client,
    url: String,
}

impl RemoteTagger {
    pub fn new(url: impl Into<String>) -> Result<Self, TaggerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TaggerError(format!("building http client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl EntityTagger for RemoteTagger {
    fn tag(&self, chunk: &str) -> Result<Vec<TaggerSpan>, TaggerError> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": chunk }))
            .send()
            .map_err(|e| TaggerError(format!("tagger request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TaggerError(format!("tagger returned HTTP {status}")));
        }
        response
            .json::<Vec<TaggerSpan>>()
            .map_err(|e| TaggerError(format!("decoding tagger response: {e}")))
    }
}
