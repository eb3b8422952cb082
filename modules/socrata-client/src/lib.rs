pub mod error;

pub use error::{Result, SocrataError};

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

/// NYC Open Data host.
pub const NYC_OPEN_DATA: &str = "data.cityofnewyork.us";

/// New York State Open Data host.
pub const NYS_OPEN_DATA: &str = "data.ny.gov";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Minimal Socrata Open Data client: typed row fetch against
/// `https://{host}/resource/{dataset}.json` with SoQL query params.
pub struct SocrataClient {
    client: reqwest::Client,
    app_token: Option<String>,
}

impl SocrataClient {
    /// Build a client. Without an app token requests run anonymously
    /// (throttled by the host, but accepted).
    pub fn new(app_token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build Socrata HTTP client");
        Self { client, app_token }
    }

    /// Fetch rows from one dataset, deserialized into `T`.
    pub async fn rows<T: DeserializeOwned>(
        &self,
        host: &str,
        dataset: &str,
        query: &SoqlQuery,
    ) -> Result<Vec<T>> {
        let url = format!("https://{host}/resource/{dataset}.json");
        let mut req = self.client.get(&url).query(&query.params());
        if let Some(token) = &self.app_token {
            req = req.header("X-App-Token", token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SocrataError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let rows: Vec<T> = resp.json().await?;
        tracing::debug!(dataset, count = rows.len(), "Fetched Socrata rows");
        Ok(rows)
    }
}

/// SoQL query parameters (`$where`, `$q`, `$order`, `$limit`).
#[derive(Debug, Default, Clone)]
pub struct SoqlQuery {
    where_clause: Option<String>,
    full_text: Option<String>,
    order: Option<String>,
    limit: Option<u32>,
}

impl SoqlQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    /// Full-text search over all columns (`$q`).
    pub fn full_text(mut self, q: impl Into<String>) -> Self {
        self.full_text = Some(q.into());
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(w) = &self.where_clause {
            params.push(("$where", w.clone()));
        }
        if let Some(q) = &self.full_text {
            params.push(("$q", q.clone()));
        }
        if let Some(o) = &self.order {
            params.push(("$order", o.clone()));
        }
        if let Some(l) = self.limit {
            params.push(("$limit", l.to_string()));
        }
        params
    }
}

/// Format a timestamp as a Socrata floating timestamp literal
/// (`2026-08-25T14:30:00`, no zone suffix).
pub fn floating_timestamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Escape a string literal for embedding in a `$where` clause.
pub fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn query_params_in_order() {
        let q = SoqlQuery::new()
            .where_clause("boro = 'BROOKLYN'")
            .order("dos_id DESC")
            .limit(5);
        let params = q.params();
        assert_eq!(
            params,
            vec![
                ("$where", "boro = 'BROOKLYN'".to_string()),
                ("$order", "dos_id DESC".to_string()),
                ("$limit", "5".to_string()),
            ]
        );
    }

    #[test]
    fn full_text_param() {
        let q = SoqlQuery::new().full_text("ACME REALTY").limit(5);
        let params = q.params();
        assert_eq!(params[0], ("$q", "ACME REALTY".to_string()));
    }

    #[test]
    fn floating_timestamp_has_no_zone_suffix() {
        let dt = Utc.with_ymd_and_hms(2026, 8, 25, 14, 30, 0).unwrap();
        assert_eq!(floating_timestamp(dt), "2026-08-25T14:30:00");
    }

    #[test]
    fn escapes_single_quotes() {
        assert_eq!(escape_literal("O'NEILL'S"), "O''NEILL''S");
        assert_eq!(escape_literal("plain"), "plain");
    }
}
