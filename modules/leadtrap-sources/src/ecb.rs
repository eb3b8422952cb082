//! ECB (OATH-adjudicated) violations (NYC Open Data `6bgk-3dad`), one
//! partition per borough. Hazardous-severity violations are flagged as
//! emergencies. Slow publication cadence, so a week of lookback.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use leadtrap_common::{snippet, Borough, Detail, Lead, ParcelId, SourceKind};
use socrata_client::{floating_timestamp, SocrataClient, SoqlQuery, NYC_OPEN_DATA};

use crate::adapter::{fetch_partitions, FetchOutcome, SourceAdapter};

const DATASET: &str = "6bgk-3dad";
const PARTITION_LIMIT: u32 = 50;
const LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct EcbViolationRow {
    ecb_violation_number: Option<String>,
    respondent_house_number: Option<String>,
    respondent_street: Option<String>,
    boro: Option<String>,
    violation_type: Option<String>,
    violation_description: Option<String>,
    severity: Option<String>,
    issue_date: Option<String>,
    ecb_violation_status: Option<String>,
    penality_imposed: Option<String>,
    block: Option<String>,
    lot: Option<String>,
}

pub struct EcbAdapter {
    socrata: Arc<SocrataClient>,
    boroughs: Vec<Borough>,
}

impl EcbAdapter {
    pub fn new(socrata: Arc<SocrataClient>, boroughs: Vec<Borough>) -> Self {
        Self { socrata, boroughs }
    }

    async fn fetch_borough(&self, borough: Borough, since: &str) -> Result<Vec<Lead>> {
        let query = SoqlQuery::new()
            .where_clause(where_clause(borough, since))
            .limit(PARTITION_LIMIT);
        let rows: Vec<EcbViolationRow> = self.socrata.rows(NYC_OPEN_DATA, DATASET, &query).await?;
        let code = borough.code();
        Ok(rows.into_iter().filter_map(|r| normalize(r, code)).collect())
    }
}

fn where_clause(borough: Borough, since: &str) -> String {
    // The dataset keys boroughs by numeric code.
    format!(
        "issue_date > '{since}' AND boro = '{}' AND \
         (UPPER(severity) LIKE '%HAZARD%' OR \
          UPPER(violation_type) LIKE '%UNSANITARY%' OR \
          UPPER(violation_description) LIKE '%PEST%' OR \
          UPPER(violation_description) LIKE '%RODENT%' OR \
          UPPER(violation_description) LIKE '%VERMIN%' OR \
          UPPER(violation_description) LIKE '%INFESTATION%')",
        borough.code()
    )
}

fn normalize(row: EcbViolationRow, borough_code: u8) -> Option<Lead> {
    let id = row.ecb_violation_number.filter(|v| !v.is_empty())?;

    let mut title = format!(
        "{} {}",
        row.respondent_house_number.as_deref().unwrap_or(""),
        row.respondent_street.as_deref().unwrap_or("")
    )
    .trim()
    .to_string();
    if title.is_empty() {
        title = "Address not provided".to_string();
    }

    let severity = row.severity.unwrap_or_default();
    let emergency = severity.to_uppercase().contains("HAZARD");

    let parcel = ParcelId::from_parts(
        borough_code,
        row.block.as_deref().unwrap_or(""),
        row.lot.as_deref().unwrap_or(""),
    );

    let description = row.violation_description.unwrap_or_default();

    let mut details = Vec::new();
    if let Some(vtype) = row.violation_type.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Type", vtype));
    }
    if !severity.is_empty() {
        details.push(Detail::new("Severity", severity));
    }
    if let Some(issued) = row.issue_date.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Issued", snippet(&issued, 10)));
    }
    if let Some(status) = row.ecb_violation_status.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Status", status));
    }
    if let Some(penalty) = row.penality_imposed.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Penalty", penalty));
    }

    Some(Lead {
        source: SourceKind::Ecb,
        id,
        title,
        description,
        details,
        link: None,
        emergency,
        parcel,
        owner: None,
    })
}

#[async_trait]
impl SourceAdapter for EcbAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Ecb
    }

    fn lookback(&self) -> Duration {
        Duration::days(LOOKBACK_DAYS)
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

    fn row() -> EcbViolationRow {
        EcbViolationRow {
            ecb_violation_number: Some("35012345Z".to_string()),
            respondent_house_number: Some("120".to_string()),
            respondent_street: Some("GRAND CONCOURSE".to_string()),
            boro: Some("2".to_string()),
            violation_type: Some("SANITATION".to_string()),
            violation_description: Some("RODENT HARBORAGE AT PREMISES".to_string()),
            severity: Some("Hazardous".to_string()),
            issue_date: Some("2026-08-21T00:00:00.000".to_string()),
            ecb_violation_status: Some("ACTIVE".to_string()),
            penality_imposed: Some("1000".to_string()),
            block: Some("2456".to_string()),
            lot: Some("12".to_string()),
        }
    }

    #[test]
    fn where_clause_mixes_severity_and_pest_terms() {
        let clause = where_clause(Borough::Bronx, "2026-08-18T09:00:00");
        assert!(clause.contains("boro = '2'"));
        assert!(clause.contains("UPPER(severity) LIKE '%HAZARD%'"));
        assert!(clause.contains("UPPER(violation_description) LIKE '%VERMIN%'"));
    }

    #[test]
    fn hazardous_severity_is_emergency() {
        let lead = normalize(row(), 2).unwrap();
        assert_eq!(lead.id, "35012345Z");
        assert!(lead.emergency);
        assert_eq!(lead.parcel.unwrap().as_str(), "2024560012");
    }

    #[test]
    fn non_hazardous_is_not_emergency() {
        let mut r = row();
        r.severity = Some("Standard".to_string());
        let lead = normalize(r, 2).unwrap();
        assert!(!lead.emergency);
    }
}
