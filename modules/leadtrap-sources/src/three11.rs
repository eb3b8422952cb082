//! NYC 311 service requests (NYC Open Data `erm2-nwe9`), one partition per
//! borough.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use leadtrap_common::{matches_pest_keywords, snippet, Borough, Detail, Lead, SourceKind};
use socrata_client::{floating_timestamp, SocrataClient, SoqlQuery, NYC_OPEN_DATA};

use crate::adapter::{fetch_partitions, FetchOutcome, SourceAdapter};

const DATASET: &str = "erm2-nwe9";
const PARTITION_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
struct ServiceRequestRow {
    unique_key: Option<String>,
    complaint_type: Option<String>,
    descriptor: Option<String>,
    incident_address: Option<String>,
    borough: Option<String>,
    incident_zip: Option<String>,
    created_date: Option<String>,
    status: Option<String>,
    agency: Option<String>,
}

pub struct Three11Adapter {
    socrata: Arc<SocrataClient>,
    boroughs: Vec<Borough>,
}

impl Three11Adapter {
    pub fn new(socrata: Arc<SocrataClient>, boroughs: Vec<Borough>) -> Self {
        Self { socrata, boroughs }
    }

    async fn fetch_borough(&self, borough: Borough, since: &str) -> Result<Vec<Lead>> {
        let query = SoqlQuery::new()
            .where_clause(where_clause(borough, since))
            .limit(PARTITION_LIMIT);
        let rows: Vec<ServiceRequestRow> =
            self.socrata.rows(NYC_OPEN_DATA, DATASET, &query).await?;
        Ok(rows.into_iter().filter_map(normalize).collect())
    }
}

/// Terms mirrored into the SoQL `$where` clause; the local filter accepts
/// anything these matched, so server-returned rows are never re-dropped.
const REQUEST_TERMS: [&str; 8] = [
    "RODENT", "PEST", "MICE", "RAT", "ROACH", "BED BUG", "BEDBUG", "UNSANITARY",
];

fn where_clause(borough: Borough, since: &str) -> String {
    let type_terms = ["RODENT", "PEST"]
        .iter()
        .map(|t| format!("UPPER(complaint_type) LIKE '%{t}%'"))
        .collect::<Vec<_>>()
        .join(" OR ");
    let descriptor_terms = REQUEST_TERMS
        .iter()
        .map(|t| format!("UPPER(descriptor) LIKE '%{t}%'"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!(
        "created_date > '{since}' AND borough = '{}' AND ({type_terms} OR {descriptor_terms})",
        borough.upper_name()
    )
}

fn is_relevant(text: &str) -> bool {
    if matches_pest_keywords(text) {
        return true;
    }
    let upper = text.to_uppercase();
    REQUEST_TERMS.iter().any(|t| upper.contains(t))
}

fn normalize(row: ServiceRequestRow) -> Option<Lead> {
    let id = row.unique_key.filter(|v| !v.is_empty())?;

    let complaint_type = row.complaint_type.unwrap_or_default();
    let descriptor = row.descriptor.unwrap_or_default();
    if !is_relevant(&format!("{complaint_type} {descriptor}")) {
        return None;
    }

    let mut address_parts = Vec::new();
    if let Some(addr) = row.incident_address.as_deref().filter(|v| !v.is_empty()) {
        address_parts.push(addr);
    }
    if let Some(boro) = row.borough.as_deref().filter(|v| !v.is_empty()) {
        address_parts.push(boro);
    }
    let title = if address_parts.is_empty() {
        "Address not provided".to_string()
    } else {
        address_parts.join(", ")
    };

    let mut details = vec![Detail::new("Type", complaint_type)];
    if !descriptor.is_empty() {
        details.push(Detail::new("Descriptor", descriptor.clone()));
    }
    if let Some(zip) = row.incident_zip.filter(|v| !v.is_empty()) {
        details.push(Detail::new("ZIP", zip));
    }
    if let Some(created) = row.created_date.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Created", snippet(&created, 10)));
    }
    if let Some(status) = row.status.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Status", status));
    }
    if let Some(agency) = row.agency.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Agency", agency));
    }

    Some(Lead {
        source: SourceKind::Complaints311,
        id,
        title,
        description: descriptor,
        details,
        link: None,
        emergency: false,
        parcel: None,
        owner: None,
    })
}

#[async_trait]
impl SourceAdapter for Three11Adapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Complaints311
    }

    async fn fetch(&self, window: Duration) -> FetchOutcome {
        let since = floating_timestamp(Utc::now() - window);
        let partitions: Vec<String> = self
            .boroughs
            .iter()
            .map(|b| b.upper_name().to_string())
            .collect();
        fetch_partitions(self.kind(), partitions, |partition| {
            let borough = Borough::parse(&partition).expect("partition built from Borough");
            let since = since.clone();
            async move { self.fetch_borough(borough, &since).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ServiceRequestRow {
        ServiceRequestRow {
            unique_key: Some("63011223".to_string()),
            complaint_type: Some("Rodent".to_string()),
            descriptor: Some("Rat Sighting".to_string()),
            incident_address: Some("88 SUYDAM STREET".to_string()),
            borough: Some("BROOKLYN".to_string()),
            incident_zip: Some("11221".to_string()),
            created_date: Some("2026-08-25T07:12:00.000".to_string()),
            status: Some("Open".to_string()),
            agency: Some("DOHMH".to_string()),
        }
    }

    #[test]
    fn where_clause_covers_type_and_descriptor() {
        let clause = where_clause(Borough::Bronx, "2026-08-24T09:00:00");
        assert!(clause.contains("borough = 'BRONX'"));
        assert!(clause.contains("UPPER(complaint_type) LIKE '%RODENT%'"));
        assert!(clause.contains("UPPER(descriptor) LIKE '%UNSANITARY%'"));
    }

    #[test]
    fn normalizes_rodent_complaint() {
        let lead = normalize(row()).unwrap();
        assert_eq!(lead.source, SourceKind::Complaints311);
        assert_eq!(lead.id, "63011223");
        assert_eq!(lead.title, "88 SUYDAM STREET, BROOKLYN");
        assert!(lead.parcel.is_none());
        assert!(lead.details.iter().any(|d| d.label == "Agency" && d.value == "DOHMH"));
    }

    #[test]
    fn server_matched_singular_descriptor_survives_locally() {
        let mut r = row();
        r.complaint_type = Some("Unsanitary Condition".to_string());
        r.descriptor = Some("Rat Sighting".to_string());
        assert!(normalize(r).is_some());

        let mut r = row();
        r.complaint_type = Some("General".to_string());
        r.descriptor = Some("Roach in apartment".to_string());
        assert!(normalize(r).is_some());
    }

    #[test]
    fn unsanitary_descriptor_passes_without_pest_keyword() {
        let mut r = row();
        r.complaint_type = Some("UNSANITARY CONDITION".to_string());
        r.descriptor = Some("Unsanitary conditions in hallway".to_string());
        assert!(normalize(r).is_some());
    }

    #[test]
    fn missing_address_gets_placeholder() {
        let mut r = row();
        r.incident_address = None;
        r.borough = None;
        assert_eq!(normalize(r).unwrap().title, "Address not provided");
    }
}
