//! Outbound notification seam. The aggregator renders a digest and hands
//! it here; delivery failure is logged and surfaced as a run-level error,
//! never retried within the run.

use anyhow::Result;
use async_trait::async_trait;

use sendgrid_client::SendGridClient;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, subject: &str, html: &str) -> Result<()>;
}

pub struct EmailNotifier {
    client: SendGridClient,
    from: String,
    to: String,
}

impl EmailNotifier {
    pub fn new(api_key: String, from: String, to: String) -> Self {
        Self {
            client: SendGridClient::new(api_key),
            from,
            to,
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn deliver(&self, subject: &str, html: &str) -> Result<()> {
        self.client
            .send_html(&self.from, &self.to, subject, html)
            .await?;
        Ok(())
    }
}
