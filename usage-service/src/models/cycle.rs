//! Billing cycle model.

use super::SubscriberKey;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One billing period for a subscriber line.
///
/// Bounds are epoch milliseconds and both are inclusive. Cycles are written
/// by an upstream system; this service only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Cycle {
    pub cycle_id: Uuid,
    #[sqlx(flatten)]
    pub subscriber: SubscriberKey,
    pub start_date: i64,
    pub end_date: i64,
}

impl Cycle {
    /// Closed-interval containment: both `start_date` and `end_date` count as inside.
    pub fn contains(&self, instant: i64) -> bool {
        self.start_date <= instant && instant <= self.end_date
    }
}

/// Cycle summary returned by the history view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleInfo {
    pub cycle_id: Uuid,
    pub start_date: i64,
    pub end_date: i64,
}

impl From<Cycle> for CycleInfo {
    fn from(cycle: Cycle) -> Self {
        Self {
            cycle_id: cycle.cycle_id,
            start_date: cycle.start_date,
            end_date: cycle.end_date,
        }
    }
}
