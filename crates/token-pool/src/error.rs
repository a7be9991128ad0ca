//! Error taxonomy for pool operations

/// Errors from pool operations.
///
/// `NoCredentialAvailable` is an expected negative result (surfaced to the
/// caller as "no credential available for this provider"), not a fault.
/// Crypto failures are hard per-operation errors; store failures propagate
/// unchanged with no engine-side retries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no credential available for provider {provider_id}")]
    NoCredentialAvailable { provider_id: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("credential not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] token_crypto::Error),

    #[error("store error: {0}")]
    Store(#[from] token_store::Error),
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
