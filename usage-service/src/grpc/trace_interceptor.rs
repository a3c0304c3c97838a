//! gRPC trace context propagation.
//!
//! Extracts W3C trace context (traceparent/tracestate) from incoming gRPC
//! metadata and makes it the parent of the current span, so usage lookups
//! join the caller's distributed trace.

use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tonic::metadata::{KeyRef, MetadataMap};
use tonic::{Request, Status};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

const TRACEPARENT_HEADER: &str = "traceparent";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// A text map extractor for gRPC metadata.
struct MetadataExtractor<'a>(&'a MetadataMap);

impl opentelemetry::propagation::Extractor for MetadataExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0
            .keys()
            .filter_map(|k| match k {
                KeyRef::Ascii(key) => Some(key.as_str()),
                KeyRef::Binary(_) => None,
            })
            .collect()
    }
}

/// Tonic interceptor that parents the current span on the caller's trace.
#[allow(clippy::result_large_err)]
pub fn trace_context_interceptor(request: Request<()>) -> Result<Request<()>, Status> {
    let metadata = request.metadata();
    let context = TraceContextPropagator::new().extract(&MetadataExtractor(metadata));
    Span::current().set_parent(context);

    if tracing::enabled!(tracing::Level::DEBUG) {
        let traceparent = metadata
            .get(TRACEPARENT_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        let request_id = metadata
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::debug!(traceparent = %traceparent, request_id = %request_id, "gRPC request received");
    }

    Ok(request)
}
