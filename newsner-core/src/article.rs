//! # Article Body Extraction
//!
//! Thai news sites wrap the article body in wildly different markup, so the
//! extractor walks an ordered list of CSS selectors and takes the first hit
//! that yields a plausible amount of text. When none does, it falls back to
//! the visible text of the whole page, capped so one javascript-heavy portal
//! cannot flood the corpus.

use scraper::{Html, Selector};

/// Selectors tried in order, most specific first.
const BODY_SELECTORS: &[&str] = &[
    "article",
    "div[itemprop='articleBody']",
    "div.entry-content",
    "div#article-body",
    "section.article",
    "div.td-post-content",
    "div#main-content",
    "div.content-detail",
    "div.post-content",
];

/// A selector hit below this many characters is treated as a false positive
/// (nav bars and teaser blocks also match `article`).
const MIN_BODY_CHARS: usize = 200;

/// Cap for the whole-page fallback.
const MAX_FALLBACK_CHARS: usize = 15_000;

/// Extracts the article body text from raw HTML.
pub fn extract_body(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector in BODY_SELECTORS {
        // all selectors in the list are compile-time constants
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for node in document.select(&selector) {
            let text = collect_text(node);
            if text.chars().count() >= MIN_BODY_CHARS {
                return text;
            }
        }
    }

    let whole: String = document.root_element().text().collect::<Vec<_>>().join(" ");
    let trimmed = whole.split_whitespace().collect::<Vec<_>>().join(" ");
    trimmed.chars().take(MAX_FALLBACK_CHARS).collect()
}

fn collect_text(node: scraper::ElementRef<'_>) -> String {
    let raw = node.text().collect::<Vec<_>>().join(" ");
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
