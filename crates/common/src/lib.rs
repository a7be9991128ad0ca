//! Common types for the token pool engine

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;

/// Current time as unix milliseconds.
///
/// All timestamps in the engine (`last_used_at`, `last_error_at`) are
/// absolute unix-millis values so they survive serialization and process
/// restarts, unlike `Instant`.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
