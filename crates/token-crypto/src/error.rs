//! Error types for cipher and key operations

/// Errors from cipher and key operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No usable master key from any source. Fatal at startup: no stored
    /// credential can be decrypted without it.
    #[error("master key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("invalid master key: {0}")]
    InvalidKey(String),

    #[error("key file I/O error: {0}")]
    Io(String),

    #[error("encryption failed: {0}")]
    Encrypt(String),

    /// Authentication tag mismatch: tampering, corruption, or wrong key.
    /// Never falls back to treating the payload as plaintext.
    #[error("decryption failed: authentication tag mismatch")]
    AuthenticationFailed,

    /// Marker present but the payload is not a well-formed envelope.
    #[error("malformed ciphertext: {0}")]
    Malformed(String),
}

/// Result alias for cipher and key operations.
pub type Result<T> = std::result::Result<T, Error>;
