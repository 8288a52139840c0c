//! RSS harvesting of Thai news articles.
//!
//! Walks a list of RSS feeds, pulls each item's description (or fetches the
//! full article page when the description is a teaser), and keeps only
//! substantial, Thai-dominant text. Dedup is two-level: by link, and by a
//! SHA-256 hash of the body so the same wire story republished under a
//! different URL is stored once.

use std::collections::HashSet;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use newsner_core::article::extract_body;
use newsner_core::corpus::NewsRecord;

/// Thai news feeds harvested by default.
pub const DEFAULT_FEEDS: &[&str] = &[
    "https://www.thairath.co.th/rss/news",
    "https://www.thairath.co.th/rss/local",
    "https://www.thairath.co.th/rss/politic",
    "https://www.thairath.co.th/rss/economy",
    "https://www.thairath.co.th/rss/sport",
    "https://www.thairath.co.th/rss/entertainment",
    "https://www.thairath.co.th/rss/foreign",
    "https://www.bangkokbiznews.com/rss/news",
    "https://mgronline.com/rss/latestnews.xml",
    "https://news.thaipbs.or.th/rss/headline.xml",
    "https://www.dailynews.co.th/rss/news",
    "https://thestandard.co/feed/",
    "https://www.matichon.co.th/feed",
    "https://www.khaosod.co.th/feed",
    "https://rssfeeds.sanook.com/rss/feeds/sanook/news.index.xml",
];

/// Rotated per request; some portals throttle on a repeated agent string.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:109.0)",
];

/// Descriptions shorter than this are teasers; the full page is fetched.
const MIN_BODY_CHARS: usize = 200;
/// Articles below this many characters are dropped outright.
const MIN_KEEP_CHARS: usize = 120;
/// Minimum share of Thai characters for an article to be kept.
const MIN_THAI_RATIO: f64 = 0.30;
/// Items taken per feed before moving on.
const PER_FEED_LIMIT: usize = 200;

pub struct Harvester {
    client: reqwest::Client,
    seen_link: HashSet<String>,
    seen_text: HashSet<String>,
}

impl Harvester {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            seen_link: HashSet::new(),
            seen_text: HashSet::new(),
        })
    }

    /// Harvests feeds until `target` articles are collected or the feed
    /// list is exhausted. Feed order is shuffled so repeated runs do not
    /// always drain the same sources first.
    pub async fn harvest(&mut self, feeds: &[String], target: usize) -> Result<Vec<NewsRecord>> {
        let mut feeds: Vec<&String> = feeds.iter().collect();
        feeds.shuffle(&mut rand::thread_rng());

        let mut bag = Vec::new();
        for (i, feed_url) in feeds.iter().enumerate() {
            info!(feed = %feed_url, "fetching feed {}/{}", i + 1, feeds.len());
            match self.harvest_feed(feed_url, target - bag.len()).await {
                Ok(mut records) => {
                    info!(feed = %feed_url, got = records.len(), "feed done");
                    bag.append(&mut records);
                }
                Err(err) => warn!(feed = %feed_url, %err, "skipping feed"),
            }
            if bag.len() >= target {
                break;
            }
            // polite jitter between feeds
            let pause = rand::thread_rng().gen_range(1.0..1.8);
            tokio::time::sleep(std::time::Duration::from_secs_f64(pause)).await;
        }
        Ok(bag)
    }

    async fn harvest_feed(&mut self, feed_url: &str, budget: usize) -> Result<Vec<NewsRecord>> {
        let bytes = self
            .get(feed_url)
            .await?
            .bytes()
            .await
            .context("reading feed body")?;
        let channel = rss::Channel::read_from(&bytes[..]).context("parsing feed")?;

        let mut records = Vec::new();
        for item in channel.items().iter().take(PER_FEED_LIMIT) {
            if records.len() >= budget {
                break;
            }
            let Some(title) = item.title().map(str::trim).filter(|t| !t.is_empty()) else {
                continue;
            };
            let Some(link) = item.link().filter(|l| !l.is_empty()) else {
                continue;
            };
            if self.seen_link.contains(link) {
                continue;
            }

            let mut text = strip_tags(item.description().unwrap_or(""));
            if text.chars().count() < MIN_BODY_CHARS {
                let full = self.fetch_article(link).await.unwrap_or_default();
                if full.chars().count() > MIN_BODY_CHARS {
                    text = full;
                }
            }
            if text.chars().count() < MIN_KEEP_CHARS || thai_ratio(&text) < MIN_THAI_RATIO {
                continue;
            }

            let digest = hex_sha256(&text);
            if !self.seen_text.insert(digest) {
                continue;
            }
            self.seen_link.insert(link.to_string());
            records.push(NewsRecord {
                title: title.to_string(),
                link: Some(link.to_string()),
                source: Some(feed_url.to_string()),
                text,
            });
        }
        Ok(records)
    }

    async fn fetch_article(&self, url: &str) -> Result<String> {
        let html = self.get(url).await?.text().await.context("reading page")?;
        Ok(extract_body(&html))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, agent)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("requesting {url}"))?;
        Ok(response)
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn thai_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let thai = text
        .chars()
        .filter(|c| ('\u{0e00}'..='\u{0e7f}').contains(c))
        .count();
    thai as f64 / total as f64
}

fn hex_sha256(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>ข่าว <b>ด่วน</b></p>"), "ข่าว ด่วน");
    }

    #[test]
    fn test_thai_ratio() {
        assert!((thai_ratio("กข12") - 0.5).abs() < 1e-9);
        assert_eq!(thai_ratio(""), 0.0);
    }

    #[test]
    fn test_hash_distinguishes_texts() {
        assert_ne!(hex_sha256("ข่าวหนึ่ง"), hex_sha256("ข่าวสอง"));
        assert_eq!(hex_sha256("ซ้ำ"), hex_sha256("ซ้ำ"));
    }
}
