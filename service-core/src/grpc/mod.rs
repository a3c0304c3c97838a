//! gRPC utilities for micros microservices.
//!
//! Error conversion between `AppError` and `tonic::Status`, plus the
//! handler result alias used by service implementations.

pub mod error;

pub use error::{GrpcResult, IntoStatus};

// Re-export commonly used tonic types
pub use tonic::{Code, Request, Response, Status};
