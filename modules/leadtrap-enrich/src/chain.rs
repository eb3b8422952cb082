//! The per-lead enrichment chain: parcel → recorded owner → (if the owner
//! looks like a business) registry entity. Strictly one-directional; a
//! miss at any stage leaves the lead unenriched from that stage on.

use std::sync::Arc;

use tracing::debug;

use leadtrap_common::Lead;
use socrata_client::SocrataClient;

use crate::business::{is_business, resolve_entity, DosRegistry, EntityRegistry};
use crate::owner::{resolve_owner, ParcelDirectory, SocrataParcelDirectory};

pub struct Enricher {
    directory: Arc<dyn ParcelDirectory>,
    registry: Arc<dyn EntityRegistry>,
}

impl Enricher {
    pub fn new(directory: Arc<dyn ParcelDirectory>, registry: Arc<dyn EntityRegistry>) -> Self {
        Self {
            directory,
            registry,
        }
    }

    /// Wire both stages to their live Socrata datasets.
    pub fn socrata(client: Arc<SocrataClient>) -> Self {
        Self::new(
            Arc::new(SocrataParcelDirectory::new(client.clone())),
            Arc::new(DosRegistry::new(client)),
        )
    }

    /// Enrich one lead in place. Leads without a parcel pass through
    /// untouched; resolution misses are not errors.
    pub async fn enrich(&self, lead: &mut Lead) {
        let Some(parcel) = &lead.parcel else {
            return;
        };

        let Some(mut owner) = resolve_owner(parcel, self.directory.as_ref()).await else {
            debug!(source = %lead.source, id = %lead.id, "No owner resolved");
            return;
        };

        if is_business(&owner.name) {
            owner.entity = resolve_entity(&owner.name, self.registry.as_ref()).await;
        }
        lead.owner = Some(owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::business::CorporationRow;
    use crate::owner::OwnerRecord;
    use leadtrap_common::{ParcelId, SourceKind};

    /// Primary always misses; fallback answers with the given owner.
    struct FallbackDirectory {
        owner: &'static str,
    }

    #[async_trait]
    impl ParcelDirectory for FallbackDirectory {
        async fn tax_lot(&self, _: u8, _: u32, _: u32) -> Result<Option<OwnerRecord>> {
            Ok(None)
        }

        async fn assessment_roll(&self, _: u8, _: u32, _: u32) -> Result<Option<OwnerRecord>> {
            Ok(Some(OwnerRecord {
                name: Some(self.owner.to_string()),
                address: None,
            }))
        }
    }

    struct CountingRegistry {
        calls: AtomicU32,
    }

    #[async_trait]
    impl EntityRegistry for CountingRegistry {
        async fn search(&self, _query: &str, _limit: u32) -> Result<Vec<CorporationRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![CorporationRow {
                dos_id: Some("4512345".to_string()),
                current_entity_name: Some("ABC REALTY LLC".to_string()),
                entity_type: Some("DOMESTIC LIMITED LIABILITY COMPANY".to_string()),
                ..Default::default()
            }])
        }
    }

    fn lead(parcel: Option<ParcelId>) -> Lead {
        Lead {
            source: SourceKind::Hpd,
            id: "1234567".to_string(),
            title: "125 COURT STREET, BROOKLYN".to_string(),
            description: "roach infestation".to_string(),
            details: vec![],
            link: None,
            emergency: false,
            parcel,
            owner: None,
        }
    }

    #[tokio::test]
    async fn fallback_owner_triggers_entity_resolution() {
        let registry = Arc::new(CountingRegistry {
            calls: AtomicU32::new(0),
        });
        let enricher = Enricher::new(
            Arc::new(FallbackDirectory {
                owner: "ABC Realty LLC",
            }),
            registry.clone(),
        );

        let mut l = lead(ParcelId::parse("3012340045"));
        enricher.enrich(&mut l).await;

        let owner = l.owner.unwrap();
        assert_eq!(owner.name, "ABC Realty LLC");
        assert_eq!(registry.calls.load(Ordering::SeqCst), 1);
        assert!(owner.entity.unwrap().lookup_url.ends_with("dosId=4512345"));
    }

    #[tokio::test]
    async fn individual_owner_skips_registry() {
        let registry = Arc::new(CountingRegistry {
            calls: AtomicU32::new(0),
        });
        let enricher = Enricher::new(
            Arc::new(FallbackDirectory {
                owner: "John Smith",
            }),
            registry.clone(),
        );

        let mut l = lead(ParcelId::parse("3012340045"));
        enricher.enrich(&mut l).await;

        let owner = l.owner.unwrap();
        assert_eq!(owner.name, "John Smith");
        assert!(owner.entity.is_none());
        assert_eq!(registry.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn leads_without_parcel_pass_through() {
        let registry = Arc::new(CountingRegistry {
            calls: AtomicU32::new(0),
        });
        let enricher = Enricher::new(
            Arc::new(FallbackDirectory {
                owner: "ABC Realty LLC",
            }),
            registry.clone(),
        );

        let mut l = lead(None);
        enricher.enrich(&mut l).await;

        assert!(l.owner.is_none());
        assert_eq!(registry.calls.load(Ordering::SeqCst), 0);
    }
}
