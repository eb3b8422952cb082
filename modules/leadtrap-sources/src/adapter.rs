// The adapter seam between the aggregator and the upstream feeds.
//
// Failure isolation is expressed as data: every partition query produces a
// PartitionOutcome instead of raising, so one borough timing out never
// aborts its siblings and the aggregator consumes a uniform shape.

use async_trait::async_trait;
use chrono::Duration;
use futures::{stream, StreamExt};
use leadtrap_common::{Lead, SourceKind};
use tracing::warn;

/// Concurrent partition queries per adapter.
const PARTITION_CONCURRENCY: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionStatus {
    /// Partition answered with relevant records.
    Fetched(usize),
    /// Partition answered, nothing relevant in the window.
    Empty,
    /// Transport/parse failure; treated as zero results.
    Failed(String),
}

/// Result of querying one independently-fetched slice of a source
/// (a borough, a feed URL, a subreddit, an account).
#[derive(Debug, Clone)]
pub struct PartitionOutcome {
    pub partition: String,
    pub status: PartitionStatus,
}

/// Everything one adapter produced in one run.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub leads: Vec<Lead>,
    pub partitions: Vec<PartitionOutcome>,
}

impl FetchOutcome {
    pub fn failed_partitions(&self) -> usize {
        self.partitions
            .iter()
            .filter(|p| matches!(p.status, PartitionStatus::Failed(_)))
            .count()
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Lookback window for this source. Most feeds publish within a day;
    /// slower sources override.
    fn lookback(&self) -> Duration {
        Duration::hours(24)
    }

    /// Fetch and filter the window across every configured partition.
    /// Never fails: partition errors are recorded in the outcome.
    async fn fetch(&self, window: Duration) -> FetchOutcome;
}

/// Run one fetch closure per partition with bounded concurrency, folding
/// results and failures into a single outcome.
pub(crate) async fn fetch_partitions<F, Fut>(
    kind: SourceKind,
    partitions: Vec<String>,
    fetch_one: F,
) -> FetchOutcome
where
    F: Fn(String) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<Vec<Lead>>>,
{
    let results: Vec<(String, anyhow::Result<Vec<Lead>>)> =
        stream::iter(partitions.into_iter().map(|partition| {
            let fut = fetch_one(partition.clone());
            async move { (partition, fut.await) }
        }))
        .buffer_unordered(PARTITION_CONCURRENCY)
        .collect()
        .await;

    let mut outcome = FetchOutcome::default();
    for (partition, result) in results {
        let status = match result {
            Ok(leads) if leads.is_empty() => PartitionStatus::Empty,
            Ok(leads) => {
                let count = leads.len();
                outcome.leads.extend(leads);
                PartitionStatus::Fetched(count)
            }
            Err(err) => {
                warn!(source = %kind, partition, %err, "Partition fetch failed, skipping");
                PartitionStatus::Failed(err.to_string())
            }
        };
        outcome.partitions.push(PartitionOutcome { partition, status });
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_partition_does_not_block_siblings() {
        let outcome = fetch_partitions(
            SourceKind::Hpd,
            vec!["BROOKLYN".to_string(), "QUEENS".to_string()],
            |partition| async move {
                if partition == "BROOKLYN" {
                    anyhow::bail!("timeout");
                }
                Ok(vec![Lead {
                    source: SourceKind::Hpd,
                    id: "v1".to_string(),
                    title: "1 Main St, QUEENS".to_string(),
                    description: "RODENT activity".to_string(),
                    details: vec![],
                    link: None,
                    emergency: false,
                    parcel: None,
                    owner: None,
                }])
            },
        )
        .await;

        assert_eq!(outcome.leads.len(), 1);
        assert_eq!(outcome.partitions.len(), 2);
        assert_eq!(outcome.failed_partitions(), 1);
        let queens = outcome
            .partitions
            .iter()
            .find(|p| p.partition == "QUEENS")
            .unwrap();
        assert_eq!(queens.status, PartitionStatus::Fetched(1));
    }

    #[tokio::test]
    async fn empty_partition_is_not_a_failure() {
        let outcome =
            fetch_partitions(SourceKind::Reddit, vec!["astoria".to_string()], |_| async {
                Ok(vec![])
            })
            .await;

        assert_eq!(outcome.failed_partitions(), 0);
        assert_eq!(outcome.partitions[0].status, PartitionStatus::Empty);
    }
}
