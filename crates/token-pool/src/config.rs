//! Pool configuration loading
//!
//! Config precedence: env vars > config file > defaults, matching the rest
//! of the backend. Thresholds are deployment-wide, not per-provider or
//! per-credential — a known scalability limitation of the current design,
//! kept as-is rather than silently extended.

use serde::Deserialize;
use std::path::Path;

/// Health thresholds for the pool engine.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Consecutive failures before a credential is quarantined.
    #[serde(default = "default_error_threshold")]
    pub error_threshold: u32,
    /// Seconds after the last error before automatic recovery.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

fn default_error_threshold() -> u32 {
    3
}

fn default_cooldown_secs() -> u64 {
    60
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            error_threshold: default_error_threshold(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl PoolConfig {
    /// Load configuration from a TOML file, then overlay environment
    /// variables (`TOKEN_ERROR_THRESHOLD`, `TOKEN_COOLDOWN_SECS`).
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: PoolConfig = toml::from_str(&contents)?;
        config.overlay_env()?.validated()
    }

    /// Defaults overlaid with environment variables, for deployments
    /// without a config file.
    pub fn from_env() -> common::Result<Self> {
        Self::default().overlay_env()?.validated()
    }

    /// Cooldown period in the engine's native unit (unix millis).
    /// Saturates for configured values past `u64::MAX / 1000`.
    pub fn cooldown_millis(&self) -> u64 {
        self.cooldown_secs.saturating_mul(1000)
    }

    fn overlay_env(mut self) -> common::Result<Self> {
        if let Ok(raw) = std::env::var("TOKEN_ERROR_THRESHOLD") {
            self.error_threshold = raw.parse().map_err(|_| {
                common::Error::Config(format!("TOKEN_ERROR_THRESHOLD must be an integer, got: {raw}"))
            })?;
        }
        if let Ok(raw) = std::env::var("TOKEN_COOLDOWN_SECS") {
            self.cooldown_secs = raw.parse().map_err(|_| {
                common::Error::Config(format!("TOKEN_COOLDOWN_SECS must be an integer, got: {raw}"))
            })?;
        }
        Ok(self)
    }

    fn validated(self) -> common::Result<Self> {
        if self.error_threshold == 0 {
            return Err(common::Error::Config(
                "error_threshold must be at least 1".into(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.error_threshold, 3);
        assert_eq!(config.cooldown_secs, 60);
        assert_eq!(config.cooldown_millis(), 60_000);
    }

    #[test]
    fn loads_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.toml");
        std::fs::write(&path, "error_threshold = 5\ncooldown_secs = 120\n").unwrap();

        let config = PoolConfig::load(&path).unwrap();
        assert_eq!(config.error_threshold, 5);
        assert_eq!(config.cooldown_secs, 120);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.toml");
        std::fs::write(&path, "cooldown_secs = 10\n").unwrap();

        let config = PoolConfig::load(&path).unwrap();
        assert_eq!(config.error_threshold, 3);
        assert_eq!(config.cooldown_secs, 10);
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.toml");
        std::fs::write(&path, "error_threshold = 0\n").unwrap();

        let result = PoolConfig::load(&path);
        assert!(matches!(result, Err(common::Error::Config(_))));
    }

    #[test]
    fn extreme_cooldown_saturates_instead_of_overflowing() {
        let config = PoolConfig {
            error_threshold: 3,
            cooldown_secs: u64::MAX,
        };
        assert_eq!(config.cooldown_millis(), u64::MAX);
    }

    #[test]
    fn zero_cooldown_is_allowed() {
        // Used by tests and aggressive deployments: quarantine heals on
        // the next selection pass.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.toml");
        std::fs::write(&path, "cooldown_secs = 0\n").unwrap();

        let config = PoolConfig::load(&path).unwrap();
        assert_eq!(config.cooldown_millis(), 0);
    }
}
