//! Domain errors for cycle and usage lookups.

use service_core::error::AppError;
use thiserror::Error;

/// Outcome kinds callers must be able to tell apart without string matching.
///
/// The two not-found kinds are expected results of valid input (a new line
/// with no cycle yet). `Store` carries infrastructure failures unchanged.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Invalid line: {0}")]
    InvalidLine(#[from] validator::ValidationErrors),

    #[error("No current cycle found for this user: {user_id} and mdn: {device_number}.")]
    NoActiveCycle {
        user_id: String,
        device_number: String,
    },

    #[error("No cycles found for this user: {user_id} and mdn: {device_number}.")]
    NoCyclesFound {
        user_id: String,
        device_number: String,
    },

    #[error(transparent)]
    Store(#[from] AppError),
}

impl CycleError {
    /// Metric/log label for the outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            CycleError::InvalidLine(_) => "invalid",
            CycleError::NoActiveCycle { .. } | CycleError::NoCyclesFound { .. } => "not_found",
            CycleError::Store(_) => "error",
        }
    }
}

impl From<CycleError> for AppError {
    fn from(err: CycleError) -> Self {
        match err {
            CycleError::InvalidLine(errors) => AppError::ValidationError(errors),
            not_found @ (CycleError::NoActiveCycle { .. } | CycleError::NoCyclesFound { .. }) => {
                AppError::NotFound(anyhow::anyhow!(not_found.to_string()))
            }
            CycleError::Store(err) => err,
        }
    }
}
