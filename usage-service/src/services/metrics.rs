//! Metrics module for usage-service.
//! Provides Prometheus metrics for cycle lookups, gRPC traffic and database latency.
//!
//! HTTP request metrics come from the `metrics` facade used by the
//! `service-core` middleware; the recorder installed here renders them next
//! to the registry metrics on `/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Recorder handle for `metrics` facade output. `None` if another recorder
/// was already installed in the process.
pub static METRICS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "usage_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Cycle lookup outcomes (found / not_found / invalid / error)
pub static CYCLE_LOOKUPS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// gRPC request counter
pub static GRPC_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// gRPC request duration histogram
pub static GRPC_REQUEST_DURATION: OnceLock<HistogramVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    });

    CYCLE_LOOKUPS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "usage_cycle_lookups_total",
                "Cycle report and history lookups by outcome"
            ),
            &["operation", "outcome"]
        )
        .expect("Failed to register CYCLE_LOOKUPS_TOTAL")
    });

    GRPC_REQUESTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("usage_grpc_requests_total", "Total gRPC requests"),
            &["method", "status"]
        )
        .expect("Failed to register GRPC_REQUESTS_TOTAL")
    });

    GRPC_REQUEST_DURATION.get_or_init(|| {
        register_histogram_vec!(
            histogram_opts!(
                "usage_grpc_request_duration_seconds",
                "gRPC request duration",
                vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
            ),
            &["method"]
        )
        .expect("Failed to register GRPC_REQUEST_DURATION")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("usage_errors_total", "Total errors by type for alerting"),
            &["error_type", "method"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .and_then(|handle| handle.as_ref())
        .map(|handle| handle.render())
        .unwrap_or_default();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return output;
    }
    if let Ok(registry_metrics) = String::from_utf8(buffer) {
        output.push_str(&registry_metrics);
    }
    output
}

/// Record the outcome of a cycle lookup.
pub fn record_cycle_lookup(operation: &str, outcome: &str) {
    if let Some(counter) = CYCLE_LOOKUPS_TOTAL.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}

/// Record a gRPC request.
pub fn record_grpc_request(method: &str, status: &str) {
    if let Some(counter) = GRPC_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method, status]).inc();
    }
}

/// Record gRPC request duration.
pub fn record_grpc_request_duration(method: &str, duration_secs: f64) {
    if let Some(histogram) = GRPC_REQUEST_DURATION.get() {
        histogram
            .with_label_values(&[method])
            .observe(duration_secs);
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, method: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, method]).inc();
    }
}
