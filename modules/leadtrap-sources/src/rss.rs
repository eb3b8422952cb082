// Shared RSS/Atom parsing for the feed-backed adapters (craigslist, nitter).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// One feed entry reduced to the fields the adapters care about.
#[derive(Debug, Clone)]
pub struct FeedStory {
    pub title: String,
    pub description: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

/// Parse an RSS/Atom body into stories. Entries without a usable link are
/// dropped (no link means no stable id).
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedStory>> {
    let feed = feed_rs::parser::parse(bytes).context("Failed to parse RSS/Atom feed")?;

    let stories = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;
            if url::Url::parse(&link).is_err() {
                return None;
            }

            Some(FeedStory {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                description: entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body))
                    .unwrap_or_default(),
                link,
                published: entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.with_timezone(&Utc)),
            })
        })
        .collect();

    Ok(stories)
}
