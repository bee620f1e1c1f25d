//! Upstream data collectors.
//!
//! Each collector talks to one platform, normalizes the response into a typed
//! snapshot from `core-types` and validates it before handing it back.

use async_trait::async_trait;
use core_types::{SnapshotBundle, SourceKind, SourceSnapshot};
use std::sync::Arc;
use tokio::task::JoinSet;

pub mod ads;
pub mod error;
pub mod events;
pub mod expenses;
pub mod responses;
pub mod retry;
pub mod secondary;

// --- Public API ---
pub use ads::AdsCollector;
pub use error::CollectorError;
pub use events::EventsCollector;
pub use expenses::ExpensesCollector;
pub use retry::RetryPolicy;
pub use secondary::SecondaryTicketsCollector;

/// The interface every upstream source implements, so the pipeline can run real
/// collectors or in-memory fakes interchangeably.
#[async_trait]
pub trait Collector: Send + Sync {
    /// The source this collector produces snapshots for.
    fn source(&self) -> SourceKind;

    /// Fetches and normalizes the current state of the source.
    async fn collect(&self) -> Result<SourceSnapshot, CollectorError>;
}

/// Runs every collector concurrently and assembles the results into a bundle.
///
/// The first failure aborts the remaining collectors.
pub async fn collect_all(
    collectors: Vec<Arc<dyn Collector>>,
) -> Result<SnapshotBundle, CollectorError> {
    let mut tasks = JoinSet::new();
    for collector in collectors {
        tasks.spawn(async move {
            let kind = collector.source();
            tracing::info!(source = %kind, "Collecting");
            collector.collect().await.inspect_err(|e| {
                tracing::error!(source = %kind, error = %e, "Collection failed");
            })
        });
    }

    let mut snapshots = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let snapshot = joined.map_err(|e| CollectorError::Task(e.to_string()))??;
        snapshots.push(snapshot);
    }

    Ok(SnapshotBundle::from_snapshots(snapshots)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::{AdSnapshot, CoreError, EventSnapshot, ExpenseSnapshot, SecondaryTicketSeries};
    use rust_decimal::Decimal;

    struct Fixed(SourceSnapshot);

    #[async_trait]
    impl Collector for Fixed {
        fn source(&self) -> SourceKind {
            self.0.kind()
        }

        async fn collect(&self) -> Result<SourceSnapshot, CollectorError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl Collector for Failing {
        fn source(&self) -> SourceKind {
            SourceKind::SecondaryTickets
        }

        async fn collect(&self) -> Result<SourceSnapshot, CollectorError> {
            Err(CollectorError::SessionExpired)
        }
    }

    fn ads() -> SourceSnapshot {
        SourceSnapshot::Ads(AdSnapshot {
            total_spend: Decimal::ZERO,
            total_ads_count: 0,
            active_ads_count: 0,
            total_impressions: 0,
            total_clicks: 0,
            ads: Vec::new(),
        })
    }

    fn others() -> Vec<Arc<dyn Collector>> {
        let now = Utc::now();
        vec![
            Arc::new(Fixed(SourceSnapshot::Events(EventSnapshot::empty()))),
            Arc::new(Fixed(SourceSnapshot::Expenses(ExpenseSnapshot::empty(now, now)))),
        ]
    }

    #[tokio::test]
    async fn bundles_every_source() {
        let mut collectors = others();
        collectors.push(Arc::new(Fixed(ads())));
        collectors.push(Arc::new(Fixed(SourceSnapshot::SecondaryTickets(
            SecondaryTicketSeries::new(),
        ))));

        let bundle = collect_all(collectors).await.unwrap();
        assert!(bundle.secondary_tickets.is_empty());
        assert_eq!(bundle.events, EventSnapshot::empty());
    }

    #[tokio::test]
    async fn any_failure_fails_the_run() {
        let mut collectors = others();
        collectors.push(Arc::new(Fixed(ads())));
        collectors.push(Arc::new(Failing));

        let err = collect_all(collectors).await.unwrap_err();
        assert!(matches!(err, CollectorError::SessionExpired));
    }

    #[tokio::test]
    async fn missing_source_is_reported() {
        let err = collect_all(others()).await.unwrap_err();
        assert!(matches!(
            err,
            CollectorError::Snapshot(CoreError::MissingSource(_))
        ));
    }
}
