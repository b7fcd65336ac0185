use sqlyard_core::SqlyardError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors with user-friendly messages
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid change: {0}")]
    InvalidChange(String),

    #[error("Backend error: {0}")]
    Backend(#[from] SqlyardError),
}
