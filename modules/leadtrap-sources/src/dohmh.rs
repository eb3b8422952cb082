//! DOHMH restaurant inspection violations (NYC Open Data `43nn-pn8j`),
//! one partition per borough. Relevance is a fixed violation-code set, not
//! a keyword match; the dataset has no single stable key so the id is a
//! `{camis}_{inspection_date}` composite.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use leadtrap_common::{snippet, Borough, Detail, Lead, SourceKind};
use socrata_client::{floating_timestamp, SocrataClient, SoqlQuery, NYC_OPEN_DATA};

use crate::adapter::{fetch_partitions, FetchOutcome, SourceAdapter};

const DATASET: &str = "43nn-pn8j";
const PARTITION_LIMIT: u32 = 50;

/// Pest violation codes: 04L mice, 04M rats, 04N roaches, 08A not
/// vermin-proof.
const PEST_CODES: [&str; 4] = ["04L", "04M", "04N", "08A"];

pub fn code_label(code: &str) -> &'static str {
    match code {
        "04L" => "Evidence of mice",
        "04M" => "Evidence of rats",
        "04N" => "Evidence of roaches",
        "08A" => "Facility not vermin-proof",
        _ => "Pest condition",
    }
}

#[derive(Debug, Deserialize)]
struct InspectionRow {
    camis: Option<String>,
    dba: Option<String>,
    building: Option<String>,
    street: Option<String>,
    boro: Option<String>,
    zipcode: Option<String>,
    phone: Option<String>,
    violation_code: Option<String>,
    violation_description: Option<String>,
    inspection_date: Option<String>,
    grade: Option<String>,
}

pub struct DohmhAdapter {
    socrata: Arc<SocrataClient>,
    boroughs: Vec<Borough>,
}

impl DohmhAdapter {
    pub fn new(socrata: Arc<SocrataClient>, boroughs: Vec<Borough>) -> Self {
        Self { socrata, boroughs }
    }

    async fn fetch_borough(&self, borough: Borough, since: &str) -> Result<Vec<Lead>> {
        let query = SoqlQuery::new()
            .where_clause(where_clause(borough, since))
            .limit(PARTITION_LIMIT);
        let rows: Vec<InspectionRow> = self.socrata.rows(NYC_OPEN_DATA, DATASET, &query).await?;
        Ok(rows.into_iter().filter_map(normalize).collect())
    }
}

fn where_clause(borough: Borough, since: &str) -> String {
    let codes = PEST_CODES
        .iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "inspection_date > '{since}' AND boro = '{}' AND violation_code IN ({codes})",
        borough.title_name()
    )
}

fn normalize(row: InspectionRow) -> Option<Lead> {
    let code = row.violation_code.filter(|v| !v.is_empty())?;
    if !PEST_CODES.contains(&code.as_str()) {
        return None;
    }
    let camis = row.camis.filter(|v| !v.is_empty())?;
    let inspection_date = row.inspection_date.filter(|v| !v.is_empty())?;
    let id = format!("{camis}_{inspection_date}");

    let title = row
        .dba
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "Unknown restaurant".to_string());

    let address = format!(
        "{} {}",
        row.building.as_deref().unwrap_or(""),
        row.street.as_deref().unwrap_or("")
    )
    .trim()
    .to_string();

    let description = row.violation_description.unwrap_or_default();

    let mut details = Vec::new();
    if !address.is_empty() {
        let boro = row.boro.as_deref().unwrap_or("");
        let full = if boro.is_empty() {
            address
        } else {
            format!("{address}, {boro}")
        };
        details.push(Detail::new("Address", full));
    }
    if let Some(zip) = row.zipcode.filter(|v| !v.is_empty()) {
        details.push(Detail::new("ZIP", zip));
    }
    if let Some(phone) = row.phone.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Phone", phone));
    }
    details.push(Detail::new("Violation", format!("[{code}] {}", code_label(&code))));
    details.push(Detail::new("Inspected", snippet(&inspection_date, 10)));
    if let Some(grade) = row.grade.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Grade", grade));
    }

    Some(Lead {
        source: SourceKind::Dohmh,
        id,
        title,
        description,
        details,
        link: None,
        emergency: false,
        parcel: None,
        owner: None,
    })
}

#[async_trait]
impl SourceAdapter for DohmhAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Dohmh
    }

    async fn fetch(&self, window: Duration) -> FetchOutcome {
        let since = floating_timestamp(Utc::now() - window);
        let partitions: Vec<String> = self
            .boroughs
            .iter()
            .map(|b| b.title_name().to_string())
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

    fn row() -> InspectionRow {
        InspectionRow {
            camis: Some("41234567".to_string()),
            dba: Some("GOLDEN WOK".to_string()),
            building: Some("42".to_string()),
            street: Some("MAIN STREET".to_string()),
            boro: Some("Queens".to_string()),
            zipcode: Some("11354".to_string()),
            phone: Some("7185551234".to_string()),
            violation_code: Some("04M".to_string()),
            violation_description: Some("Evidence of rats or live rats present".to_string()),
            inspection_date: Some("2026-08-24T00:00:00.000".to_string()),
            grade: Some("B".to_string()),
        }
    }

    #[test]
    fn where_clause_uses_code_set_and_title_case_boro() {
        let clause = where_clause(Borough::Brooklyn, "2026-08-24T09:00:00");
        assert!(clause.contains("boro = 'Brooklyn'"));
        assert!(clause.contains("violation_code IN ('04L', '04M', '04N', '08A')"));
    }

    #[test]
    fn composite_id_is_stable() {
        let a = normalize(row()).unwrap();
        let b = normalize(row()).unwrap();
        assert_eq!(a.id, "41234567_2026-08-24T00:00:00.000");
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn labels_violation_code() {
        let lead = normalize(row()).unwrap();
        assert_eq!(lead.title, "GOLDEN WOK");
        assert!(lead
            .details
            .iter()
            .any(|d| d.label == "Violation" && d.value == "[04M] Evidence of rats"));
    }

    #[test]
    fn drops_non_pest_codes() {
        let mut r = row();
        r.violation_code = Some("10F".to_string());
        assert!(normalize(r).is_none());
    }

    #[test]
    fn drops_rows_missing_composite_parts() {
        let mut r = row();
        r.camis = None;
        assert!(normalize(r).is_none());
        let mut r = row();
        r.inspection_date = None;
        assert!(normalize(r).is_none());
    }
}
