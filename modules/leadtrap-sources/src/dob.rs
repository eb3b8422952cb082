//! DOB violations (NYC Open Data `3h2n-5cm9`), one partition per borough.
//! Publication cadence is slower than HPD, so the lookback is a week and
//! the per-partition cap lower.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use leadtrap_common::{snippet, Borough, Detail, Lead, ParcelId, SourceKind};
use socrata_client::{floating_timestamp, SocrataClient, SoqlQuery, NYC_OPEN_DATA};

use crate::adapter::{fetch_partitions, FetchOutcome, SourceAdapter};

const DATASET: &str = "3h2n-5cm9";
const PARTITION_LIMIT: u32 = 30;
const LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct DobViolationRow {
    isn_dob_bis_extract: Option<String>,
    number: Option<String>,
    house_number: Option<String>,
    street: Option<String>,
    boro: Option<String>,
    zip: Option<String>,
    violation_type: Option<String>,
    violation_category: Option<String>,
    issue_date: Option<String>,
    disposition_comments: Option<String>,
    block: Option<String>,
    lot: Option<String>,
}

pub struct DobAdapter {
    socrata: Arc<SocrataClient>,
    boroughs: Vec<Borough>,
}

impl DobAdapter {
    pub fn new(socrata: Arc<SocrataClient>, boroughs: Vec<Borough>) -> Self {
        Self { socrata, boroughs }
    }

    async fn fetch_borough(&self, borough: Borough, since: &str) -> Result<Vec<Lead>> {
        let query = SoqlQuery::new()
            .where_clause(where_clause(borough, since))
            .limit(PARTITION_LIMIT);
        let rows: Vec<DobViolationRow> = self.socrata.rows(NYC_OPEN_DATA, DATASET, &query).await?;
        let code = borough.code();
        Ok(rows.into_iter().filter_map(|r| normalize(r, code)).collect())
    }
}

fn where_clause(borough: Borough, since: &str) -> String {
    // The dataset keys boroughs by numeric code.
    format!(
        "issue_date > '{since}' AND boro = '{}' AND \
         (UPPER(violation_type_code) LIKE '%HAZARD%' OR \
          UPPER(violation_category) LIKE '%HAZARD%' OR \
          UPPER(violation_type) LIKE '%UNSAFE%' OR \
          UPPER(violation_type) LIKE '%UNSANITARY%')",
        borough.code()
    )
}

fn normalize(row: DobViolationRow, borough_code: u8) -> Option<Lead> {
    let id = row.isn_dob_bis_extract.filter(|v| !v.is_empty())?;

    let mut title = format!(
        "{} {}",
        row.house_number.as_deref().unwrap_or(""),
        row.street.as_deref().unwrap_or("")
    )
    .trim()
    .to_string();
    if title.is_empty() {
        title = "Address not provided".to_string();
    } else if let Some(b) = Borough::parse(row.boro.as_deref().unwrap_or("")) {
        title = format!("{title}, {}", b.upper_name());
    } else if (1..=5).contains(&borough_code) {
        // boro column is the numeric code; spell it out for display
        let name = match borough_code {
            1 => "MANHATTAN",
            2 => "BRONX",
            3 => "BROOKLYN",
            4 => "QUEENS",
            _ => "STATEN ISLAND",
        };
        title = format!("{title}, {name}");
    }

    let parcel = ParcelId::from_parts(
        borough_code,
        row.block.as_deref().unwrap_or(""),
        row.lot.as_deref().unwrap_or(""),
    );

    let description = row.violation_type.clone().unwrap_or_default();

    let mut details = Vec::new();
    if let Some(number) = row.number.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Number", number));
    }
    if let Some(zip) = row.zip.filter(|v| !v.is_empty()) {
        details.push(Detail::new("ZIP", zip));
    }
    if let Some(vtype) = row.violation_type.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Type", vtype));
    }
    if let Some(category) = row.violation_category.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Category", category));
    }
    if let Some(issued) = row.issue_date.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Issued", snippet(&issued, 10)));
    }
    details.push(Detail::new(
        "Disposition",
        row.disposition_comments
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "Pending".to_string()),
    ));

    Some(Lead {
        source: SourceKind::Dob,
        id,
        title,
        description,
        details,
        link: None,
        emergency: false,
        parcel,
        owner: None,
    })
}

#[async_trait]
impl SourceAdapter for DobAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Dob
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

    fn row() -> DobViolationRow {
        DobViolationRow {
            isn_dob_bis_extract: Some("2468013".to_string()),
            number: Some("V082526-3456".to_string()),
            house_number: Some("900".to_string()),
            street: Some("FLATBUSH AVE".to_string()),
            boro: Some("3".to_string()),
            zip: Some("11226".to_string()),
            violation_type: Some("UNSAFE BUILDING".to_string()),
            violation_category: Some("V-DOB VIOLATION - ACTIVE".to_string()),
            issue_date: Some("2026-08-20T00:00:00.000".to_string()),
            disposition_comments: None,
            block: Some("5678".to_string()),
            lot: Some("9".to_string()),
        }
    }

    #[test]
    fn where_clause_uses_numeric_boro_code() {
        let clause = where_clause(Borough::Brooklyn, "2026-08-18T09:00:00");
        assert!(clause.contains("boro = '3'"));
        assert!(clause.contains("UPPER(violation_type) LIKE '%UNSAFE%'"));
    }

    #[test]
    fn lookback_is_a_week() {
        let adapter = DobAdapter::new(Arc::new(SocrataClient::new(None)), vec![]);
        assert_eq!(adapter.lookback(), Duration::days(7));
    }

    #[test]
    fn composes_parcel_from_borough_block_lot() {
        let lead = normalize(row(), 3).unwrap();
        assert_eq!(lead.id, "2468013");
        assert_eq!(lead.title, "900 FLATBUSH AVE, BROOKLYN");
        assert_eq!(lead.parcel.unwrap().as_str(), "3056780009");
        assert!(lead
            .details
            .iter()
            .any(|d| d.label == "Disposition" && d.value == "Pending"));
    }

    #[test]
    fn missing_block_or_lot_means_no_parcel() {
        let mut r = row();
        r.block = None;
        let lead = normalize(r, 3).unwrap();
        assert!(lead.parcel.is_none());
    }
}
