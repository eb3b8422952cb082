//! Parcel owner resolution: primary PLUTO tax-lot lookup with a DOF
//! assessment-roll fallback, both keyed by (borough, block, lot) with
//! leading zeros stripped. Never raises past this boundary: transport
//! and parse failures degrade to an absent result.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use leadtrap_common::{OwnerInfo, ParcelId};
use socrata_client::{SocrataClient, SoqlQuery, NYC_OPEN_DATA};

const PLUTO_DATASET: &str = "64uk-42ks";
const DOF_DATASET: &str = "8y4t-faws";

/// Owner fields as returned by either dataset.
#[derive(Debug, Clone)]
pub struct OwnerRecord {
    pub name: Option<String>,
    pub address: Option<String>,
}

impl OwnerRecord {
    fn usable_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Trait seam over the two tax-lot datasets.
#[async_trait]
pub trait ParcelDirectory: Send + Sync {
    /// Primary: PLUTO tax-lot attributes.
    async fn tax_lot(&self, borough: u8, block: u32, lot: u32) -> Result<Option<OwnerRecord>>;

    /// Fallback: DOF property assessment roll.
    async fn assessment_roll(&self, borough: u8, block: u32, lot: u32)
        -> Result<Option<OwnerRecord>>;
}

#[derive(Debug, Deserialize)]
struct PlutoRow {
    ownername: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssessmentRow {
    owner: Option<String>,
}

pub struct SocrataParcelDirectory {
    socrata: Arc<SocrataClient>,
}

impl SocrataParcelDirectory {
    pub fn new(socrata: Arc<SocrataClient>) -> Self {
        Self { socrata }
    }
}

#[async_trait]
impl ParcelDirectory for SocrataParcelDirectory {
    async fn tax_lot(&self, borough: u8, block: u32, lot: u32) -> Result<Option<OwnerRecord>> {
        let query = SoqlQuery::new()
            .where_clause(format!("borocode = {borough} AND block = {block} AND lot = {lot}"))
            .limit(1);
        let rows: Vec<PlutoRow> = self.socrata.rows(NYC_OPEN_DATA, PLUTO_DATASET, &query).await?;
        Ok(rows.into_iter().next().map(|r| OwnerRecord {
            name: r.ownername,
            address: r.address,
        }))
    }

    async fn assessment_roll(
        &self,
        borough: u8,
        block: u32,
        lot: u32,
    ) -> Result<Option<OwnerRecord>> {
        let query = SoqlQuery::new()
            .where_clause(format!("boro = '{borough}' AND block = '{block}' AND lot = '{lot}'"))
            .limit(1);
        let rows: Vec<AssessmentRow> = self.socrata.rows(NYC_OPEN_DATA, DOF_DATASET, &query).await?;
        Ok(rows.into_iter().next().map(|r| OwnerRecord {
            name: r.owner,
            address: None,
        }))
    }
}

/// Resolve the recorded owner for a parcel. The fallback dataset is tried
/// whenever the primary yields no usable (non-blank) owner name, including
/// on primary failure.
pub async fn resolve_owner(parcel: &ParcelId, directory: &dyn ParcelDirectory) -> Option<OwnerInfo> {
    let (borough, block, lot) = (parcel.borough(), parcel.block(), parcel.lot());

    let primary = match directory.tax_lot(borough, block, lot).await {
        Ok(record) => record,
        Err(err) => {
            warn!(parcel = %parcel, %err, "Primary tax-lot lookup failed, trying fallback");
            None
        }
    };

    if let Some(record) = &primary {
        if let Some(name) = record.usable_name() {
            return Some(OwnerInfo {
                name: name.to_string(),
                mailing_address: record.address.clone().filter(|a| !a.trim().is_empty()),
                entity: None,
            });
        }
    }

    let fallback = match directory.assessment_roll(borough, block, lot).await {
        Ok(record) => record,
        Err(err) => {
            warn!(parcel = %parcel, %err, "Fallback assessment-roll lookup failed");
            None
        }
    };

    match fallback {
        Some(record) => {
            let name = record.usable_name()?.to_string();
            Some(OwnerInfo {
                name,
                mailing_address: record.address.clone().filter(|a| !a.trim().is_empty()),
                entity: None,
            })
        }
        None => {
            debug!(parcel = %parcel, "No owner record in either dataset");
            None
        }
    }
}
