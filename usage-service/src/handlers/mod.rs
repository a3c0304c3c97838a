//! HTTP handlers for usage-service.

pub mod cycles;

pub use cycles::{current_cycle_report, cycle_history};
