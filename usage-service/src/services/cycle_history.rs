//! Cycle history for a line.

use crate::error::CycleError;
use crate::models::{CycleInfo, SubscriberKey};
use crate::services::store::CycleStore;
use std::sync::Arc;
use tracing::instrument;

/// Lists every cycle on record for a line, newest first.
#[derive(Clone)]
pub struct CycleHistoryBuilder {
    cycles: Arc<dyn CycleStore>,
}

impl CycleHistoryBuilder {
    pub fn new(cycles: Arc<dyn CycleStore>) -> Self {
        Self { cycles }
    }

    /// Full history in store order (`start_date` descending). Fails with
    /// `NoCyclesFound` rather than returning an empty list.
    #[instrument(skip(self, subscriber), fields(user_id = %subscriber.user_id, mdn = %subscriber.device_number))]
    pub async fn build_cycle_history(
        &self,
        subscriber: &SubscriberKey,
    ) -> Result<Vec<CycleInfo>, CycleError> {
        let cycles = self.cycles.find_all_by_subscriber(subscriber).await?;

        if cycles.is_empty() {
            return Err(CycleError::NoCyclesFound {
                user_id: subscriber.user_id.clone(),
                device_number: subscriber.device_number.clone(),
            });
        }

        tracing::debug!(cycles = cycles.len(), "Built cycle history");

        Ok(cycles.into_iter().map(CycleInfo::from).collect())
    }
}
