use std::env;
use std::path::PathBuf;

use crate::types::Borough;

const DEFAULT_SENDER: &str = "leads@yourleadmonitor.com";
const DEFAULT_NITTER: &str = "https://nitter.net";
const DEFAULT_LEDGER: &str = "seen_leads.json";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Recipient of the digest email.
    pub email_to: String,
    /// Sender identity.
    pub email_from: String,
    /// Missing key disables delivery (the run still polls and persists).
    pub sendgrid_api_key: Option<String>,
    /// Missing token falls back to throttled anonymous Socrata access.
    pub socrata_app_token: Option<String>,
    pub nitter_base_url: String,
    pub ledger_path: PathBuf,
    /// Boroughs of interest; one fetch partition per borough.
    pub boroughs: Vec<Borough>,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing or malformed.
    pub fn from_env() -> Self {
        Self {
            email_to: required_env("EMAIL_TO"),
            email_from: env::var("SENDGRID_EMAIL").unwrap_or_else(|_| DEFAULT_SENDER.to_string()),
            sendgrid_api_key: env::var("SENDGRID_API_KEY").ok().filter(|v| !v.is_empty()),
            socrata_app_token: env::var("SOCRATA_APP_TOKEN").ok().filter(|v| !v.is_empty()),
            nitter_base_url: env::var("NITTER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_NITTER.to_string()),
            ledger_path: env::var("LEDGER_PATH")
                .unwrap_or_else(|_| DEFAULT_LEDGER.to_string())
                .into(),
            boroughs: parse_boroughs(env::var("BOROUGHS").ok().as_deref()),
        }
    }

    /// Log which secrets are present without logging their values.
    pub fn log_redacted(&self) {
        tracing::info!(
            email_to = %self.email_to,
            sendgrid_key = self.sendgrid_api_key.is_some(),
            socrata_token = self.socrata_app_token.is_some(),
            ledger = %self.ledger_path.display(),
            boroughs = ?self.boroughs,
            "Config loaded"
        );
    }
}

fn parse_boroughs(raw: Option<&str>) -> Vec<Borough> {
    match raw {
        None => vec![Borough::Brooklyn, Borough::Queens, Borough::Bronx],
        Some(list) => list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                Borough::parse(s).unwrap_or_else(|| panic!("Unknown borough in BOROUGHS: {s}"))
            })
            .collect(),
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
