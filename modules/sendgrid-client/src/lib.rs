pub mod error;

pub use error::{Result, SendGridError};

use std::time::Duration;

use serde::Serialize;

const MAIL_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Minimal SendGrid v3 mail-send client.
pub struct SendGridClient {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Serialize)]
struct MailSend<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    content: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
    subject: &'a str,
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

impl SendGridClient {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build SendGrid HTTP client");
        Self { client, api_key }
    }

    /// Send a single HTML email. SendGrid acknowledges acceptance with 202.
    pub async fn send_html(&self, from: &str, to: &str, subject: &str, html: &str) -> Result<()> {
        let payload = MailSend {
            personalizations: vec![Personalization {
                to: vec![Address { email: to }],
                subject,
            }],
            from: Address { email: from },
            content: vec![Content {
                content_type: "text/html",
                value: html,
            }],
        };

        let resp = self
            .client
            .post(MAIL_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() != 202 {
            let body = resp.text().await.unwrap_or_default();
            return Err(SendGridError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        tracing::info!(to, subject, "Email accepted by SendGrid");
        Ok(())
    }
}
