//! Domain models for usage-service.

mod cycle;
mod subscriber;
mod usage;

pub use cycle::{Cycle, CycleInfo};
pub use subscriber::{LineInfo, SubscriberKey};
pub use usage::{DailyUsageRecord, DailyUsageReport};
