//! In-process store backed by vectors.
//!
//! Implements the same query semantics as the PostgreSQL store. Used by the
//! unit tests and for running the service logic without a database.

use crate::models::{Cycle, DailyUsageRecord, SubscriberKey};
use crate::services::store::{CycleStore, UsageStore};
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::{RwLock, RwLockReadGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    cycles: RwLock<Vec<Cycle>>,
    usage: RwLock<Vec<DailyUsageRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cycle. Returns the assigned id.
    pub fn insert_cycle(&self, subscriber: &SubscriberKey, start_date: i64, end_date: i64) -> Uuid {
        let cycle_id = Uuid::new_v4();
        let cycle = Cycle {
            cycle_id,
            subscriber: subscriber.clone(),
            start_date,
            end_date,
        };
        self.cycles
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(cycle);
        cycle_id
    }

    /// Seed a usage record. Returns the assigned id.
    pub fn insert_usage(&self, subscriber: &SubscriberKey, usage_date: i64, used_amount: i64) -> Uuid {
        let usage_id = Uuid::new_v4();
        let record = DailyUsageRecord {
            usage_id,
            subscriber: subscriber.clone(),
            usage_date,
            used_amount,
        };
        self.usage
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
        usage_id
    }

    fn read_cycles(&self) -> RwLockReadGuard<'_, Vec<Cycle>> {
        self.cycles
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_usage(&self) -> RwLockReadGuard<'_, Vec<DailyUsageRecord>> {
        self.usage
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CycleStore for InMemoryStore {
    async fn find_active_cycle(
        &self,
        subscriber: &SubscriberKey,
        instant: i64,
    ) -> Result<Option<Cycle>, AppError> {
        let matching = self
            .read_cycles()
            .iter()
            .filter(|c| &c.subscriber == subscriber && c.contains(instant))
            .cloned()
            .collect::<Vec<_>>();

        if matching.len() > 1 {
            tracing::warn!(
                user_id = %subscriber.user_id,
                mdn = %subscriber.device_number,
                instant = instant,
                matches = matching.len(),
                "Overlapping cycles contain the reference instant"
            );
        }

        // Insertion order stands in for store order.
        Ok(matching.into_iter().next())
    }

    async fn find_all_by_subscriber(
        &self,
        subscriber: &SubscriberKey,
    ) -> Result<Vec<Cycle>, AppError> {
        let mut cycles = self
            .read_cycles()
            .iter()
            .filter(|c| &c.subscriber == subscriber)
            .cloned()
            .collect::<Vec<_>>();
        cycles.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(cycles)
    }
}

#[async_trait]
impl UsageStore for InMemoryStore {
    async fn find_in_window(
        &self,
        subscriber: &SubscriberKey,
        start_inclusive: i64,
        end_inclusive: i64,
    ) -> Result<Vec<DailyUsageRecord>, AppError> {
        Ok(self
            .read_usage()
            .iter()
            .filter(|r| {
                &r.subscriber == subscriber
                    && start_inclusive <= r.usage_date
                    && r.usage_date <= end_inclusive
            })
            .cloned()
            .collect())
    }
}
