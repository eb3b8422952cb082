//! Twitter/X via per-account Nitter RSS, one partition per monitored
//! account. The tweet id is the numeric `/status/` segment of the link.
//! Tweets must match the pest vocabulary and carry an NYC cue.

use std::sync::{Arc, LazyLock};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use regex::Regex;

use leadtrap_common::{matches_pest_keywords, mentions_nyc, Detail, Lead, SourceKind};

use crate::adapter::{fetch_partitions, FetchOutcome, SourceAdapter};
use crate::fetch::BodyFetcher;
use crate::rss::{parse_feed, FeedStory};

pub struct TwitterAdapter {
    fetcher: Arc<dyn BodyFetcher>,
    accounts: Vec<&'static str>,
    nitter_base_url: String,
}

impl TwitterAdapter {
    pub fn new(
        fetcher: Arc<dyn BodyFetcher>,
        accounts: Vec<&'static str>,
        nitter_base_url: String,
    ) -> Self {
        Self {
            fetcher,
            accounts,
            nitter_base_url,
        }
    }

    async fn fetch_account(&self, account: &str, cutoff: chrono::DateTime<Utc>) -> Result<Vec<Lead>> {
        let feed_url = format!("{}/{account}/rss", self.nitter_base_url);
        let body = self.fetcher.get(&feed_url).await?;
        let stories = parse_feed(&body)?;
        Ok(stories
            .into_iter()
            .filter(|s| s.published.map_or(true, |p| p >= cutoff))
            .filter_map(|s| normalize(s, account))
            .collect())
    }
}

static STATUS_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)").expect("Invalid status id regex"));

/// Extract the numeric status id from a tweet link.
pub fn status_id(link: &str) -> Option<String> {
    STATUS_ID_RE.captures(link).map(|c| c[1].to_string())
}

fn normalize(story: FeedStory, account: &str) -> Option<Lead> {
    let id = status_id(&story.link)?;

    let text = format!("{} {}", story.title, story.description);
    if !matches_pest_keywords(&text) || !mentions_nyc(&text) {
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
        source: SourceKind::Twitter,
        id,
        title: format!("@{account}"),
        description: story.title,
        details,
        link: Some(story.link),
        emergency: false,
        parcel: None,
        owner: None,
    })
}

#[async_trait]
impl SourceAdapter for TwitterAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Twitter
    }

    async fn fetch(&self, window: Duration) -> FetchOutcome {
        let cutoff = Utc::now() - window;
        let partitions: Vec<String> = self.accounts.iter().map(|a| a.to_string()).collect();
        fetch_partitions(self.kind(), partitions, |account| async move {
            self.fetch_account(&account, cutoff).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(title: &str) -> FeedStory {
        FeedStory {
            title: title.to_string(),
            description: String::new(),
            link: "https://nitter.net/NYCHA/status/1960011122334455".to_string(),
            published: None,
        }
    }

    #[test]
    fn extracts_status_id() {
        assert_eq!(
            status_id("https://nitter.net/NYCHA/status/1960011122334455"),
            Some("1960011122334455".to_string())
        );
        assert_eq!(status_id("https://nitter.net/NYCHA"), None);
    }

    #[test]
    fn requires_pest_keyword_and_nyc_cue() {
        assert!(normalize(story("Rodent mitigation work this week in Brooklyn"), "NYCHA").is_some());
        assert!(normalize(story("Rodent mitigation schedule update"), "NYCHA").is_none());
        assert!(normalize(story("Brooklyn street fair this weekend"), "NYCHA").is_none());
    }

    #[test]
    fn titles_by_account() {
        let lead = normalize(story("Rodent activity reported in Queens parks"), "nycgov").unwrap();
        assert_eq!(lead.title, "@nycgov");
        assert_eq!(lead.description, "Rodent activity reported in Queens parks");
    }
}
