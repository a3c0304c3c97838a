//! Data-access ports consumed by the cycle and usage components.
//!
//! Every query is scoped by the full subscriber key. Implementations return
//! `AppError::DatabaseError` for infrastructure failures; callers propagate
//! those unchanged.

use crate::models::{Cycle, DailyUsageRecord, SubscriberKey};
use async_trait::async_trait;
use service_core::error::AppError;

/// Read access to billing cycles.
#[async_trait]
pub trait CycleStore: Send + Sync {
    /// Find the cycle with `start_date <= instant <= end_date` for the line.
    ///
    /// Cycles of one line are assumed not to overlap. If they do, which of
    /// the matching cycles is returned depends on the store.
    async fn find_active_cycle(
        &self,
        subscriber: &SubscriberKey,
        instant: i64,
    ) -> Result<Option<Cycle>, AppError>;

    /// All cycles of the line ordered by `start_date` descending.
    ///
    /// Returns an empty vector when the line has none.
    async fn find_all_by_subscriber(
        &self,
        subscriber: &SubscriberKey,
    ) -> Result<Vec<Cycle>, AppError>;
}

/// Read access to daily usage records.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Records of the line with `start_inclusive <= usage_date <= end_inclusive`.
    ///
    /// No ordering is promised.
    async fn find_in_window(
        &self,
        subscriber: &SubscriberKey,
        start_inclusive: i64,
        end_inclusive: i64,
    ) -> Result<Vec<DailyUsageRecord>, AppError>;
}
