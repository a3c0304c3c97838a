//! Shared test doubles for the service unit tests.

use crate::models::{Cycle, DailyUsageRecord, SubscriberKey};
use crate::services::store::{CycleStore, UsageStore};
use async_trait::async_trait;
use service_core::error::AppError;

pub const DAY: i64 = 24 * 60 * 60 * 1000;

/// Store whose every query fails like an unreachable database.
pub struct FailingStore;

fn unreachable_db() -> AppError {
    AppError::DatabaseError(anyhow::anyhow!("connection refused"))
}

#[async_trait]
impl CycleStore for FailingStore {
    async fn find_active_cycle(
        &self,
        _subscriber: &SubscriberKey,
        _instant: i64,
    ) -> Result<Option<Cycle>, AppError> {
        Err(unreachable_db())
    }

    async fn find_all_by_subscriber(
        &self,
        _subscriber: &SubscriberKey,
    ) -> Result<Vec<Cycle>, AppError> {
        Err(unreachable_db())
    }
}

#[async_trait]
impl UsageStore for FailingStore {
    async fn find_in_window(
        &self,
        _subscriber: &SubscriberKey,
        _start_inclusive: i64,
        _end_inclusive: i64,
    ) -> Result<Vec<DailyUsageRecord>, AppError> {
        Err(unreachable_db())
    }
}
