//! One monitor run: fetch every source, dedup against the ledger, enrich
//! parcel-carrying leads, persist, notify.
//!
//! Dedup is recorded eagerly: every candidate goes into the ledger before
//! enrichment or delivery, so a crash mid-run cannot cause unbounded
//! re-notification on retry. Only ledger persist failure and delivery
//! failure surface as run errors, and both are attempted before either is
//! returned.

use std::sync::Arc;

use chrono::Utc;
use futures::{stream, StreamExt};
use tracing::{info, warn};

use leadtrap_common::{Lead, MonitorError};
use leadtrap_enrich::Enricher;
use leadtrap_ledger::Ledger;
use leadtrap_sources::{FetchOutcome, SourceAdapter};

use crate::digest::Digest;
use crate::notifier::Notifier;
use crate::stats::RunStats;

const ADAPTER_CONCURRENCY: usize = 4;
const ENRICH_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy)]
enum RunPhase {
    Fetching,
    Deduplicating,
    Enriching,
    Notifying,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunPhase::Fetching => "fetching",
            RunPhase::Deduplicating => "deduplicating",
            RunPhase::Enriching => "enriching",
            RunPhase::Notifying => "notifying",
        };
        f.write_str(name)
    }
}

pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    enricher: Enricher,
    notifier: Option<Arc<dyn Notifier>>,
    /// Poll, dedup, and render without persisting or delivering.
    dry_run: bool,
}

impl Aggregator {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        enricher: Enricher,
        notifier: Option<Arc<dyn Notifier>>,
        dry_run: bool,
    ) -> Self {
        Self {
            adapters,
            enricher,
            notifier,
            dry_run,
        }
    }

    pub async fn run(&self, ledger: &mut Ledger) -> Result<RunStats, MonitorError> {
        let mut stats = RunStats::default();

        info!(phase = %RunPhase::Fetching, adapters = self.adapters.len(), "Run phase");
        let outcomes: Vec<FetchOutcome> = stream::iter(self.adapters.iter().cloned())
            .map(|adapter| async move { adapter.fetch(adapter.lookback()).await })
            .buffer_unordered(ADAPTER_CONCURRENCY)
            .collect()
            .await;

        info!(phase = %RunPhase::Deduplicating, "Run phase");
        let mut fresh: Vec<Lead> = Vec::new();
        for outcome in outcomes {
            stats.failed_partitions += outcome.failed_partitions() as u32;
            for lead in outcome.leads {
                stats.candidates += 1;
                if ledger.record(lead.source, &lead.id) {
                    *stats.new_by_source.entry(lead.source).or_insert(0) += 1;
                    fresh.push(lead);
                } else {
                    stats.duplicates += 1;
                }
            }
        }

        info!(phase = %RunPhase::Enriching, leads = fresh.len(), "Run phase");
        let enricher = &self.enricher;
        let fresh: Vec<Lead> = stream::iter(fresh)
            .map(|mut lead| async move {
                enricher.enrich(&mut lead).await;
                lead
            })
            .buffered(ENRICH_CONCURRENCY)
            .collect()
            .await;
        for lead in &fresh {
            if let Some(owner) = &lead.owner {
                stats.owners_resolved += 1;
                if owner.entity.is_some() {
                    stats.entities_matched += 1;
                }
            }
        }

        // Persist before notifying so a delivery hiccup never loses dedup
        // state for the leads just recorded.
        let persist_err = if self.dry_run {
            info!("Dry run: skipping ledger persist");
            None
        } else {
            ledger.persist().err()
        };
        if let Some(err) = &persist_err {
            warn!(%err, "Ledger persist failed; continuing to notification");
        }

        info!(phase = %RunPhase::Notifying, new_leads = stats.new_leads(), "Run phase");
        let delivery_err = if fresh.is_empty() {
            info!("No new leads, skipping notification");
            None
        } else {
            let digest = Digest::build(fresh, Utc::now());
            if self.dry_run {
                info!(subject = %digest.subject(), "Dry run: rendered digest\n{}", digest.render());
                None
            } else {
                match &self.notifier {
                    None => {
                        info!("Delivery disabled (no credential), digest not sent");
                        None
                    }
                    Some(notifier) => {
                        match notifier.deliver(&digest.subject(), &digest.render()).await {
                            Ok(()) => {
                                stats.delivered = true;
                                None
                            }
                            Err(err) => {
                                warn!(%err, "Digest delivery failed");
                                Some(MonitorError::Delivery(err.to_string()))
                            }
                        }
                    }
                }
            }
        };

        if let Some(err) = persist_err {
            return Err(err);
        }
        if let Some(err) = delivery_err {
            return Err(err);
        }
        Ok(stats)
    }
}
