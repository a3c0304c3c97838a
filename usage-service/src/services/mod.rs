//! Services module for usage-service.

pub mod cycle_history;
pub mod cycle_service;
pub mod database;
pub mod memory;
pub mod metrics;
pub mod resolver;
pub mod store;
pub mod usage_report;

#[cfg(test)]
mod testing;

pub use cycle_history::CycleHistoryBuilder;
pub use cycle_service::CycleService;
pub use database::Database;
pub use memory::InMemoryStore;
pub use metrics::{
    get_metrics, init_metrics, record_cycle_lookup, record_error, record_grpc_request,
    record_grpc_request_duration,
};
pub use resolver::CycleResolver;
pub use store::{CycleStore, UsageStore};
pub use usage_report::UsageReportBuilder;
