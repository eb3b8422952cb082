// Raw-body fetch seam for the RSS/JSON feed adapters. Behind a trait so
// adapter tests can run against canned bodies with no network.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;

const FEED_TIMEOUT_SECS: u64 = 15;

/// The User-Agent reddit and nitter expect from a polite poller.
pub const USER_AGENT: &str = "leadtrap-monitor/0.1";

#[async_trait]
pub trait BodyFetcher: Send + Sync {
    /// GET a URL and return the raw body. Non-2xx is an error.
    async fn get(&self, url: &str) -> Result<Bytes>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build feed HTTP client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BodyFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Bytes> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            bail!("GET {url} returned status {status}");
        }
        Ok(resp.bytes().await?)
    }
}
