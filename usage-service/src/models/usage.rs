//! Daily usage model.

use super::SubscriberKey;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One day's data consumption for a subscriber line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DailyUsageRecord {
    pub usage_id: Uuid,
    #[sqlx(flatten)]
    pub subscriber: SubscriberKey,
    /// Epoch milliseconds.
    pub usage_date: i64,
    /// Megabytes.
    #[sqlx(rename = "used_in_mb")]
    pub used_amount: i64,
}

/// Report line: the usage day and the amount, identity stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsageReport {
    pub date: i64,
    #[serde(rename = "dailyUsage")]
    pub amount: i64,
}

impl From<DailyUsageRecord> for DailyUsageReport {
    fn from(record: DailyUsageRecord) -> Self {
        Self {
            date: record.usage_date,
            amount: record.used_amount,
        }
    }
}
