//! gRPC module for usage-service.

mod service;
mod trace_interceptor;

pub use service::UsageServiceImpl;
pub use trace_interceptor::trace_context_interceptor;

/// Generated protobuf code.
pub mod proto {
    tonic::include_proto!("micros.usage.v1");

    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("usage_descriptor");
}
