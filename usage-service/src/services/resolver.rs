//! Active cycle resolution.

use crate::models::{Cycle, SubscriberKey};
use crate::services::store::CycleStore;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

/// Finds the cycle that contains a reference instant for a line.
#[derive(Clone)]
pub struct CycleResolver {
    cycles: Arc<dyn CycleStore>,
}

impl CycleResolver {
    pub fn new(cycles: Arc<dyn CycleStore>) -> Self {
        Self { cycles }
    }

    /// Returns the cycle with `start_date <= reference_instant <= end_date`, or
    /// `None` when the line has no such cycle.
    ///
    /// Precondition: cycles of one line do not overlap. No tie-break is
    /// applied when they do.
    #[instrument(skip(self, subscriber), fields(user_id = %subscriber.user_id, mdn = %subscriber.device_number))]
    pub async fn resolve_current_cycle(
        &self,
        subscriber: &SubscriberKey,
        reference_instant: i64,
    ) -> Result<Option<Cycle>, AppError> {
        let cycle = self
            .cycles
            .find_active_cycle(subscriber, reference_instant)
            .await?;

        match &cycle {
            Some(c) => tracing::debug!(cycle_id = %c.cycle_id, "Active cycle resolved"),
            None => tracing::debug!(reference_instant, "No active cycle"),
        }

        Ok(cycle)
    }
}
