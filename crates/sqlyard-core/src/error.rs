//! Error types for sqlyard

use thiserror::Error;

/// Core error type for sqlyard operations
#[derive(Error, Debug)]
pub enum SqlyardError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for sqlyard operations
pub type Result<T> = std::result::Result<T, SqlyardError>;
