//! Business-entity resolution against the NY Department of State
//! active-corporations registry.
//!
//! The search heuristic (first two significant words, newest-first
//! tie-break, first result containing the first word, else first result
//! unconditionally) is deliberately simple and known to mis-match common
//! names; precision is bounded by the registry's own full-text search.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use leadtrap_common::{snippet, BusinessEntityInfo};
use socrata_client::{escape_literal, SocrataClient, SoqlQuery, NYS_OPEN_DATA};

const DOS_DATASET: &str = "n9v6-gdp6";
const SEARCH_LIMIT: u32 = 5;
const QUERY_FALLBACK_CHARS: usize = 20;

/// Corporate-suffix/keyword substrings that mark an owner name as a
/// business rather than a private individual.
const BUSINESS_MARKERS: [&str; 22] = [
    "LLC",
    "L.L.C",
    "INC",
    "CORP",
    "LLP",
    " LP",
    "L.P.",
    "REALTY",
    "HOLDINGS",
    "TRUST",
    "MANAGEMENT",
    "ASSOCIATES",
    "PARTNERS",
    "GROUP",
    "PROPERTIES",
    "EQUITIES",
    "ESTATES",
    "HDFC",
    "CONDOMINIUM",
    "APARTMENTS",
    "COMPANY",
    "DEVELOPMENT",
];

/// Legal suffixes, articles, and conjunctions stripped before building the
/// registry query.
const STOP_WORDS: [&str; 16] = [
    "LLC", "L.L.C", "INC", "CORP", "CORPORATION", "INCORPORATED", "LLP", "LP", "L.P", "CO",
    "COMPANY", "THE", "OF", "AND", "&", "A",
];

/// Heuristic business classifier. Absent or empty names are not businesses.
pub fn is_business(name: &str) -> bool {
    let upper = name.to_uppercase();
    if upper.trim().is_empty() {
        return false;
    }
    BUSINESS_MARKERS.iter().any(|m| upper.contains(m))
}

/// Uppercase, strip punctuation and stop words, keep the remaining words
/// in order.
fn significant_words(name: &str) -> Vec<String> {
    name.to_uppercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// One row of the active-corporations dataset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorporationRow {
    pub dos_id: Option<String>,
    pub current_entity_name: Option<String>,
    pub entity_type: Option<String>,
    pub registered_agent_name: Option<String>,
    pub registered_agent_address_1: Option<String>,
    pub registered_agent_city: Option<String>,
    pub registered_agent_state: Option<String>,
    pub registered_agent_zip: Option<String>,
    pub location_name: Option<String>,
    pub location_address_1: Option<String>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_zip: Option<String>,
}

/// Trait seam over the corporation registry search.
#[async_trait]
pub trait EntityRegistry: Send + Sync {
    /// Full-text search, top `limit` results ordered by descending DOS id
    /// (newest filings first).
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<CorporationRow>>;
}

pub struct DosRegistry {
    socrata: Arc<SocrataClient>,
}

impl DosRegistry {
    pub fn new(socrata: Arc<SocrataClient>) -> Self {
        Self { socrata }
    }
}

#[async_trait]
impl EntityRegistry for DosRegistry {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<CorporationRow>> {
        let soql = SoqlQuery::new()
            .full_text(escape_literal(query))
            .order("dos_id DESC")
            .limit(limit);
        Ok(self.socrata.rows(NYS_OPEN_DATA, DOS_DATASET, &soql).await?)
    }
}

/// Resolve the closest registry match for a business owner name. Only call
/// when `is_business(name)` holds. Returns `None` on zero results or when
/// the selected row carries no substantive fields.
pub async fn resolve_entity(
    name: &str,
    registry: &dyn EntityRegistry,
) -> Option<BusinessEntityInfo> {
    let upper = name.to_uppercase();
    let words = significant_words(name);
    let query = if words.is_empty() {
        snippet(upper.trim(), QUERY_FALLBACK_CHARS)
    } else {
        words
            .iter()
            .take(2)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    };

    let rows = match registry.search(&query, SEARCH_LIMIT).await {
        Ok(rows) => rows,
        Err(err) => {
            debug!(name, %err, "Registry search failed");
            return None;
        }
    };
    if rows.is_empty() {
        return None;
    }

    // First result whose name contains the first significant word, else the
    // first result unconditionally.
    let selected = words
        .first()
        .and_then(|first| {
            rows.iter().find(|r| {
                r.current_entity_name
                    .as_deref()
                    .is_some_and(|n| n.to_uppercase().contains(first))
            })
        })
        .unwrap_or(&rows[0]);

    let entity_type = selected
        .entity_type
        .clone()
        .filter(|v| !v.trim().is_empty());
    let registered_agent = join_nonempty(&[
        selected.registered_agent_name.as_deref(),
        selected.registered_agent_address_1.as_deref(),
        selected.registered_agent_city.as_deref(),
        selected.registered_agent_state.as_deref(),
        selected.registered_agent_zip.as_deref(),
    ]);
    let office_address = join_nonempty(&[
        selected.location_name.as_deref(),
        selected.location_address_1.as_deref(),
        selected.location_city.as_deref(),
        selected.location_state.as_deref(),
        selected.location_zip.as_deref(),
    ]);

    if entity_type.is_none() && registered_agent.is_none() && office_address.is_none() {
        return None;
    }

    let dos_id = selected.dos_id.clone().filter(|v| !v.is_empty())?;
    Some(BusinessEntityInfo {
        entity_type,
        // The dataset lists active filings only.
        status: "Active".to_string(),
        registered_agent,
        office_address,
        lookup_url: format!("https://apps.dos.ny.gov/publicInquiry/EntityDisplay?dosId={dos_id}"),
    })
}

/// Comma-join, omitting empty fields. `None` when nothing survives.
fn join_nonempty(fields: &[Option<&str>]) -> Option<String> {
    let parts: Vec<&str> = fields
        .iter()
        .filter_map(|f| f.map(str::trim))
        .filter(|f| !f.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
