//! Error conversion from `AppError` to `tonic::Status`.
//!
//! | AppError | gRPC Status |
//! |----------|-------------|
//! | `ValidationError`, `BadRequest` | `INVALID_ARGUMENT` |
//! | `NotFound` | `NOT_FOUND` |
//! | `ServiceUnavailable` | `UNAVAILABLE` |
//! | `InternalError`, `DatabaseError`, `ConfigError` | `INTERNAL` |
//!
//! Internal failures are logged with their cause and returned to the
//! caller with a generic message only.

use tonic::Status;

use crate::error::AppError;

/// Extension trait for converting types into `tonic::Status`.
pub trait IntoStatus {
    /// Convert into a `tonic::Status`.
    fn into_status(self) -> Status;
}

impl IntoStatus for AppError {
    fn into_status(self) -> Status {
        match self {
            AppError::ValidationError(err) => {
                Status::invalid_argument(format!("Validation failed: {}", err))
            }
            AppError::BadRequest(err) => Status::invalid_argument(err.to_string()),
            AppError::NotFound(err) => Status::not_found(err.to_string()),
            AppError::ServiceUnavailable => Status::unavailable("Service unavailable"),
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "Internal error");
                Status::internal("Internal server error")
            }
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error");
                Status::internal("Internal server error")
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                Status::internal("Internal server error")
            }
        }
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        err.into_status()
    }
}

/// Result type alias for gRPC handlers.
pub type GrpcResult<T> = Result<tonic::Response<T>, Status>;
