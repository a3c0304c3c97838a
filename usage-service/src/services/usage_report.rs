//! Daily usage report for the active cycle.

use crate::error::CycleError;
use crate::models::{DailyUsageReport, SubscriberKey};
use crate::services::resolver::CycleResolver;
use crate::services::store::UsageStore;
use std::sync::Arc;
use tracing::instrument;

/// Builds the usage history of the cycle that is active at a given instant.
#[derive(Clone)]
pub struct UsageReportBuilder {
    resolver: CycleResolver,
    usage: Arc<dyn UsageStore>,
}

impl UsageReportBuilder {
    pub fn new(resolver: CycleResolver, usage: Arc<dyn UsageStore>) -> Self {
        Self { resolver, usage }
    }

    /// Usage records inside the active cycle, most recent day first.
    ///
    /// Fails with `NoActiveCycle` when no cycle contains `reference_instant`.
    /// A cycle without usage yields an empty report. The usage query is only
    /// issued once the cycle is resolved.
    #[instrument(skip(self, subscriber), fields(user_id = %subscriber.user_id, mdn = %subscriber.device_number))]
    pub async fn build_current_cycle_report(
        &self,
        subscriber: &SubscriberKey,
        reference_instant: i64,
    ) -> Result<Vec<DailyUsageReport>, CycleError> {
        let cycle = self
            .resolver
            .resolve_current_cycle(subscriber, reference_instant)
            .await?
            .ok_or_else(|| CycleError::NoActiveCycle {
                user_id: subscriber.user_id.clone(),
                device_number: subscriber.device_number.clone(),
            })?;

        let mut records = self
            .usage
            .find_in_window(subscriber, cycle.start_date, cycle.end_date)
            .await?;

        // Stable, so equal dates keep store order across repeated calls.
        records.sort_by(|a, b| b.usage_date.cmp(&a.usage_date));

        tracing::debug!(
            cycle_id = %cycle.cycle_id,
            records = records.len(),
            "Built current cycle report"
        );

        Ok(records.into_iter().map(DailyUsageReport::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::InMemoryStore;
    use crate::services::store::CycleStore;
    use crate::services::testing::{FailingStore, DAY};
    use service_core::error::AppError;

    const NOW: i64 = 1_718_000_000_000;

    fn builder(store: Arc<InMemoryStore>) -> UsageReportBuilder {
        UsageReportBuilder::new(CycleResolver::new(store.clone()), store)
    }

    #[tokio::test]
    async fn reports_usage_most_recent_first() {
        let store = Arc::new(InMemoryStore::new());
        let key = SubscriberKey::new("U1", "M1");
        store.insert_cycle(&key, NOW - 10 * DAY, NOW + 20 * DAY);
        store.insert_usage(&key, NOW - DAY, 100);
        store.insert_usage(&key, NOW, 128);

        let report = builder(store)
            .build_current_cycle_report(&key, NOW)
            .await
            .unwrap();

        assert_eq!(
            report,
            vec![
                DailyUsageReport { date: NOW, amount: 128 },
                DailyUsageReport { date: NOW - DAY, amount: 100 },
            ]
        );
    }

    #[tokio::test]
    async fn missing_cycle_is_no_active_cycle() {
        let store = Arc::new(InMemoryStore::new());
        let key = SubscriberKey::new("U1", "M1");
        store.insert_usage(&key, NOW, 50);

        let err = builder(store)
            .build_current_cycle_report(&key, NOW)
            .await
            .unwrap_err();

        match err {
            CycleError::NoActiveCycle {
                user_id,
                device_number,
            } => {
                assert_eq!(user_id, "U1");
                assert_eq!(device_number, "M1");
            }
            other => panic!("Expected NoActiveCycle, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cycle_without_usage_is_empty_success() {
        let store = Arc::new(InMemoryStore::new());
        let key = SubscriberKey::new("U1", "M1");
        store.insert_cycle(&key, NOW - 10 * DAY, NOW + 20 * DAY);

        let report = builder(store)
            .build_current_cycle_report(&key, NOW)
            .await
            .unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn window_includes_bounds_and_excludes_neighbours() {
        let store = Arc::new(InMemoryStore::new());
        let key = SubscriberKey::new("U1", "M1");
        let (start, end) = (NOW - 10 * DAY, NOW + 20 * DAY);
        store.insert_cycle(&key, start, end);
        store.insert_usage(&key, start - DAY, 1);
        store.insert_usage(&key, start, 2);
        store.insert_usage(&key, end, 3);
        store.insert_usage(&key, end + DAY, 4);

        let report = builder(store)
            .build_current_cycle_report(&key, NOW)
            .await
            .unwrap();

        let amounts: Vec<i64> = report.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![3, 2]);
    }

    #[tokio::test]
    async fn other_lines_never_leak_into_report() {
        let store = Arc::new(InMemoryStore::new());
        let key = SubscriberKey::new("U1", "M1");
        store.insert_cycle(&key, NOW - DAY, NOW + DAY);
        store.insert_usage(&key, NOW, 10);
        store.insert_usage(&SubscriberKey::new("U1", "M2"), NOW, 20);
        store.insert_usage(&SubscriberKey::new("U2", "M1"), NOW, 30);

        let report = builder(store)
            .build_current_cycle_report(&key, NOW)
            .await
            .unwrap();
        assert_eq!(report, vec![DailyUsageReport { date: NOW, amount: 10 }]);
    }

    #[tokio::test]
    async fn equal_dates_keep_a_deterministic_order() {
        let store = Arc::new(InMemoryStore::new());
        let key = SubscriberKey::new("U1", "M1");
        store.insert_cycle(&key, NOW - DAY, NOW + DAY);
        store.insert_usage(&key, NOW, 1);
        store.insert_usage(&key, NOW, 2);
        store.insert_usage(&key, NOW - DAY, 3);
        let builder = builder(store);

        let first = builder.build_current_cycle_report(&key, NOW).await.unwrap();
        let second = builder.build_current_cycle_report(&key, NOW).await.unwrap();

        assert_eq!(first, second);
        let amounts: Vec<i64> = first.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn usage_store_failure_propagates() {
        let cycles = Arc::new(InMemoryStore::new());
        let key = SubscriberKey::new("U1", "M1");
        cycles.insert_cycle(&key, NOW - DAY, NOW + DAY);
        let builder = UsageReportBuilder::new(
            CycleResolver::new(cycles as Arc<dyn CycleStore>),
            Arc::new(FailingStore),
        );

        let err = builder
            .build_current_cycle_report(&key, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, CycleError::Store(AppError::DatabaseError(_))));
    }
}
