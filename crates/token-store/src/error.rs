//! Error types for store operations

/// Errors from credential store operations.
///
/// The engine propagates these unchanged and adds no retry logic of its
/// own; retries belong to the caller or the store implementation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("credential not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store I/O error: {0}")]
    Io(String),

    #[error("store parse error: {0}")]
    Parse(String),
}

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;
