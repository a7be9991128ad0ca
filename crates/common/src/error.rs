//! Common error types

use thiserror::Error;

/// Errors shared across crates: configuration loading and file I/O.
///
/// Engine-specific failures (crypto, store, selection) live in their own
/// crates; this type only covers the concerns every crate touches.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_carries_message() {
        let err = Error::Config("error_threshold must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: error_threshold must be at least 1"
        );
    }

    #[test]
    fn io_error_converts_via_from() {
        let err: Error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "key file").into();
        assert!(err.to_string().starts_with("I/O error:"), "got: {err}");
    }

    #[test]
    fn error_debug_includes_variant() {
        let err = Error::Config("bad value".into());
        let debug = format!("{err:?}");
        assert!(
            debug.contains("Config"),
            "Debug should include variant name, got: {debug}"
        );
    }
}
