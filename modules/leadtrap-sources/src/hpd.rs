//! HPD housing maintenance violations (NYC Open Data `wvxf-dwi5`), one
//! partition per borough. Class C violations are flagged as emergencies.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use leadtrap_common::{matches_pest_keywords, snippet, Borough, Detail, Lead, ParcelId, SourceKind};
use socrata_client::{floating_timestamp, SocrataClient, SoqlQuery, NYC_OPEN_DATA};

use crate::adapter::{fetch_partitions, FetchOutcome, SourceAdapter};

const DATASET: &str = "wvxf-dwi5";
const PARTITION_LIMIT: u32 = 50;

/// Terms mirrored into the SoQL `$where` clause to narrow server-side
/// before the local keyword filter runs.
const NOV_TERMS: [&str; 9] = [
    "PEST", "ROACH", "RODENT", "MICE", "RAT", "BED BUG", "BEDBUG", "VERMIN", "INFESTATION",
];

#[derive(Debug, Deserialize)]
struct HpdViolationRow {
    violationid: Option<String>,
    housenumber: Option<String>,
    streetname: Option<String>,
    apartment: Option<String>,
    boro: Option<String>,
    zip: Option<String>,
    class: Option<String>,
    novdescription: Option<String>,
    inspectiondate: Option<String>,
    currentstatus: Option<String>,
    bbl: Option<String>,
    boroid: Option<String>,
    block: Option<String>,
    lot: Option<String>,
}

pub struct HpdAdapter {
    socrata: Arc<SocrataClient>,
    boroughs: Vec<Borough>,
}

impl HpdAdapter {
    pub fn new(socrata: Arc<SocrataClient>, boroughs: Vec<Borough>) -> Self {
        Self { socrata, boroughs }
    }

    async fn fetch_borough(&self, borough: Borough, since: &str) -> Result<Vec<Lead>> {
        let query = SoqlQuery::new()
            .where_clause(where_clause(borough, since))
            .limit(PARTITION_LIMIT);
        let rows: Vec<HpdViolationRow> = self
            .socrata
            .rows(NYC_OPEN_DATA, DATASET, &query)
            .await?;
        Ok(rows.into_iter().filter_map(normalize).collect())
    }
}

fn where_clause(borough: Borough, since: &str) -> String {
    let terms = NOV_TERMS
        .iter()
        .map(|t| format!("UPPER(novdescription) LIKE '%{t}%'"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!(
        "inspectiondate > '{since}' AND boro = '{}' AND ({terms})",
        borough.upper_name()
    )
}

/// Local relevance check. A superset of the server-side narrowing: any row
/// the `$where` terms matched must survive, plus the broader pest
/// vocabulary for rows found through other columns.
fn is_relevant(description: &str) -> bool {
    if matches_pest_keywords(description) {
        return true;
    }
    let upper = description.to_uppercase();
    NOV_TERMS.iter().any(|t| upper.contains(t))
}

fn normalize(row: HpdViolationRow) -> Option<Lead> {
    let description = row.novdescription.unwrap_or_default();
    if !is_relevant(&description) {
        return None;
    }
    let id = row.violationid.filter(|v| !v.is_empty())?;

    let mut title = format!(
        "{} {}",
        row.housenumber.as_deref().unwrap_or(""),
        row.streetname.as_deref().unwrap_or("")
    )
    .trim()
    .to_string();
    if let Some(boro) = row.boro.as_deref().filter(|b| !b.is_empty()) {
        if title.is_empty() {
            title = boro.to_string();
        } else {
            title = format!("{title}, {boro}");
        }
    }
    if title.is_empty() {
        title = "Address not provided".to_string();
    }

    let class = row.class.unwrap_or_default();
    let emergency = class == "C";

    let parcel = row
        .bbl
        .as_deref()
        .and_then(ParcelId::parse)
        .or_else(|| {
            let boroid: u8 = row.boroid.as_deref()?.trim().parse().ok()?;
            ParcelId::from_parts(boroid, row.block.as_deref()?, row.lot.as_deref()?)
        });

    let mut details = Vec::new();
    if let Some(apt) = row.apartment.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Apartment", apt));
    }
    if let Some(zip) = row.zip.filter(|v| !v.is_empty()) {
        details.push(Detail::new("ZIP", zip));
    }
    if !class.is_empty() {
        details.push(Detail::new("Class", class));
    }
    if let Some(date) = row.inspectiondate.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Inspected", snippet(&date, 10)));
    }
    if let Some(status) = row.currentstatus.filter(|v| !v.is_empty()) {
        details.push(Detail::new("Status", status));
    }

    Some(Lead {
        source: SourceKind::Hpd,
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
impl SourceAdapter for HpdAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Hpd
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
