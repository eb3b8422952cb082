//! Craigslist search RSS, one partition per configured feed URL. The post
//! id is the numeric segment of the item link (`/7812345678.html`), the
//! only identifier stable across feed reorderings.

use std::sync::{Arc, LazyLock};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use regex::Regex;

use leadtrap_common::{matches_pest_keywords, snippet, Detail, Lead, SourceKind};

use crate::adapter::{fetch_partitions, FetchOutcome, SourceAdapter};
use crate::fetch::BodyFetcher;
use crate::rss::{parse_feed, FeedStory};

const DESCRIPTION_CHARS: usize = 200;

pub struct CraigslistAdapter {
    fetcher: Arc<dyn BodyFetcher>,
    feeds: Vec<String>,
}

impl CraigslistAdapter {
    pub fn new(fetcher: Arc<dyn BodyFetcher>, feeds: Vec<String>) -> Self {
        Self { fetcher, feeds }
    }

    async fn fetch_feed(&self, feed_url: &str, cutoff: chrono::DateTime<Utc>) -> Result<Vec<Lead>> {
        let body = self.fetcher.get(feed_url).await?;
        let stories = parse_feed(&body)?;
        Ok(stories
            .into_iter()
            .filter(|s| s.published.map_or(true, |p| p >= cutoff))
            .filter_map(normalize)
            .collect())
    }
}

static POST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)\.html").expect("Invalid craigslist id regex"));

/// Extract the numeric post id from a craigslist item link.
pub fn post_id(link: &str) -> Option<String> {
    POST_ID_RE.captures(link).map(|c| c[1].to_string())
}

fn normalize(story: FeedStory) -> Option<Lead> {
    let id = post_id(&story.link)?;
    if !matches_pest_keywords(&format!("{} {}", story.title, story.description)) {
        return None;
    }

    let mut details = Vec::new();
    if let Some(published) = story.published {
        details.push(Detail::new(
            "Posted",
            published.format("%Y-%m-%d %H:%M").to_string(),
        ));
    }

    Some(Lead {
        source: SourceKind::Craigslist,
        id,
        title: story.title,
        description: snippet(&story.description, DESCRIPTION_CHARS),
        details,
        link: Some(story.link),
        emergency: false,
        parcel: None,
        owner: None,
    })
}

#[async_trait]
impl SourceAdapter for CraigslistAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Craigslist
    }

    async fn fetch(&self, window: Duration) -> FetchOutcome {
        let cutoff = Utc::now() - window;
        fetch_partitions(self.kind(), self.feeds.clone(), |feed_url| async move {
            self.fetch_feed(&feed_url, cutoff).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BodyFetcher;
    use bytes::Bytes;
    use std::collections::HashMap;

    struct MockFetcher {
        bodies: HashMap<String, &'static str>,
    }

    #[async_trait]
    impl BodyFetcher for MockFetcher {
        async fn get(&self, url: &str) -> Result<Bytes> {
            match self.bodies.get(url) {
                Some(body) => Ok(Bytes::from_static(body.as_bytes())),
                None => anyhow::bail!("503 from {url}"),
            }
        }
    }

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>search</title>
  <item>
    <title>Exterminator needed - mice in walls</title>
    <link>https://newyork.craigslist.org/brk/bks/d/x/7812345678.html</link>
    <description>Hearing mice in the walls every night, need pest control</description>
    <pubDate>Tue, 25 Aug 2026 09:00:00 GMT</pubDate>
  </item>
  <item>
    <title>Couch for sale</title>
    <link>https://newyork.craigslist.org/brk/fuo/d/x/7899999999.html</link>
    <description>Great condition</description>
    <pubDate>Tue, 25 Aug 2026 10:00:00 GMT</pubDate>
  </item>
</channel></rss>"#;

    #[test]
    fn extracts_numeric_post_id() {
        assert_eq!(
            post_id("https://newyork.craigslist.org/brk/bks/d/x/7812345678.html"),
            Some("7812345678".to_string())
        );
        assert_eq!(post_id("https://newyork.craigslist.org/about"), None);
    }

    #[tokio::test]
    async fn filters_by_keyword_and_isolates_failed_feeds() {
        let good = "https://newyork.craigslist.org/search/bks?format=rss".to_string();
        let bad = "https://newyork.craigslist.org/search/apa?format=rss".to_string();
        let fetcher = MockFetcher {
            bodies: HashMap::from([(good.clone(), FEED)]),
        };
        let adapter = CraigslistAdapter::new(Arc::new(fetcher), vec![good, bad]);

        let outcome = adapter.fetch(Duration::hours(24 * 365 * 10)).await;
        // The couch post fails the keyword filter; the bad feed fails alone.
        assert_eq!(outcome.leads.len(), 1);
        assert_eq!(outcome.leads[0].id, "7812345678");
        assert_eq!(outcome.failed_partitions(), 1);
    }
}
