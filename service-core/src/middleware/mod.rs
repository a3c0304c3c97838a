//! HTTP middleware shared by the service routers.

pub mod metrics;
pub mod tracing;
