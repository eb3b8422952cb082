//! Reddit `new.json` listings, one partition per subreddit. A post from a
//! general subreddit must also carry an NYC-area cue in its text; the core
//! NYC subreddits imply the area by themselves.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;

use leadtrap_common::{matches_pest_keywords, mentions_nyc, snippet, Detail, Lead, SourceKind};

use crate::adapter::{fetch_partitions, FetchOutcome, SourceAdapter};
use crate::fetch::BodyFetcher;

const LISTING_LIMIT: u32 = 25;
const TEXT_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    selftext: String,
    permalink: Option<String>,
    created_utc: Option<f64>,
}

pub struct RedditAdapter {
    fetcher: Arc<dyn BodyFetcher>,
    subreddits: Vec<&'static str>,
    nyc_subreddits: Vec<&'static str>,
}

impl RedditAdapter {
    pub fn new(
        fetcher: Arc<dyn BodyFetcher>,
        subreddits: Vec<&'static str>,
        nyc_subreddits: Vec<&'static str>,
    ) -> Self {
        Self {
            fetcher,
            subreddits,
            nyc_subreddits,
        }
    }

    fn implies_nyc(&self, subreddit: &str) -> bool {
        self.nyc_subreddits
            .iter()
            .any(|s| s.eq_ignore_ascii_case(subreddit))
    }

    async fn fetch_subreddit(
        &self,
        subreddit: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Lead>> {
        let url = format!("https://www.reddit.com/r/{subreddit}/new.json?limit={LISTING_LIMIT}");
        let body = self.fetcher.get(&url).await?;
        let listing: Listing =
            serde_json::from_slice(&body).context("Failed to parse reddit listing")?;

        let implied = self.implies_nyc(subreddit);
        Ok(listing
            .data
            .children
            .into_iter()
            .filter_map(|child| normalize(child.data, subreddit, implied, cutoff))
            .collect())
    }
}

fn normalize(
    post: RedditPost,
    subreddit: &str,
    subreddit_implies_nyc: bool,
    cutoff: DateTime<Utc>,
) -> Option<Lead> {
    let id = post.id.filter(|v| !v.is_empty())?;
    let title = post.title.unwrap_or_default();

    let text = format!("{title} {}", post.selftext);
    if !matches_pest_keywords(&text) {
        return None;
    }
    if !subreddit_implies_nyc && !mentions_nyc(&text) {
        return None;
    }

    let created = post
        .created_utc
        .and_then(|ts| Utc.timestamp_opt(ts as i64, 0).single());
    if let Some(created) = created {
        if created < cutoff {
            return None;
        }
    }

    let mut details = Vec::new();
    if let Some(created) = created {
        details.push(Detail::new(
            "Posted",
            created.format("%Y-%m-%d %H:%M").to_string(),
        ));
    }

    Some(Lead {
        source: SourceKind::Reddit,
        id,
        title: format!("r/{subreddit}: {title}"),
        description: snippet(&post.selftext, TEXT_CHARS),
        details,
        link: post
            .permalink
            .map(|p| format!("https://reddit.com{p}")),
        emergency: false,
        parcel: None,
        owner: None,
    })
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Reddit
    }

    async fn fetch(&self, window: Duration) -> FetchOutcome {
        let cutoff = Utc::now() - window;
        let partitions: Vec<String> = self.subreddits.iter().map(|s| s.to_string()).collect();
        fetch_partitions(self.kind(), partitions, |subreddit| async move {
            self.fetch_subreddit(&subreddit, cutoff).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, selftext: &str) -> RedditPost {
        RedditPost {
            id: Some("1abcde".to_string()),
            title: Some(title.to_string()),
            selftext: selftext.to_string(),
            permalink: Some("/r/Bushwick/comments/1abcde/x/".to_string()),
            created_utc: Some(1_787_000_000.0),
        }
    }

    fn old_cutoff() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).single().unwrap()
    }

    #[test]
    fn nyc_subreddit_needs_no_textual_cue() {
        let lead = normalize(post("Roaches in my walk-up", ""), "nyc", true, old_cutoff());
        assert!(lead.is_some());
        assert_eq!(lead.unwrap().title, "r/nyc: Roaches in my walk-up");
    }

    #[test]
    fn general_subreddit_needs_nyc_cue() {
        assert!(normalize(
            post("Bed bug panic", "found one on the mattress"),
            "Bedbugs",
            false,
            old_cutoff()
        )
        .is_none());

        let lead = normalize(
            post("Bed bug panic", "found one in my Queens apartment"),
            "Bedbugs",
            false,
            old_cutoff(),
        );
        assert!(lead.is_some());
    }

    #[test]
    fn non_pest_posts_dropped() {
        assert!(normalize(post("Best pizza in nyc?", ""), "nyc", true, old_cutoff()).is_none());
    }

    #[test]
    fn stale_posts_dropped_by_window() {
        let cutoff = Utc.timestamp_opt(1_790_000_000, 0).single().unwrap();
        assert!(normalize(post("mice everywhere", ""), "nyc", true, cutoff).is_none());
    }

    #[test]
    fn permalink_expands_to_full_url() {
        let lead = normalize(post("rats in basement", ""), "nyc", true, old_cutoff()).unwrap();
        assert_eq!(
            lead.link.as_deref(),
            Some("https://reddit.com/r/Bushwick/comments/1abcde/x/")
        );
    }

    #[test]
    fn listing_json_deserializes() {
        let json = r#"{"data":{"children":[{"data":{"id":"1abcde","title":"rats!","selftext":"so many rats","permalink":"/r/nyc/comments/1abcde/rats/","created_utc":1787000000.0}}]}}"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.data.children.len(), 1);
        assert_eq!(listing.data.children[0].data.id.as_deref(), Some("1abcde"));
    }
}
