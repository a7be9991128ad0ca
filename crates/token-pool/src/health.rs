//! Credential health state machine
//!
//! Two states per credential, `healthy` and quarantined (`healthy =
//! false`), driven by the error counter:
//!
//! - healthy → quarantined: error count reaches the threshold
//! - quarantined → healthy: cooldown elapsed since the last error
//!   (automatic, applied at selection time) or an explicit reset (manual)
//!
//! A success report clears the error streak but does not lift an existing
//! quarantine — only cooldown expiry or a reset does. All transitions are
//! pure over the credential's fields; persistence is the caller's job.

use token_store::Credential;
use tracing::info;

use crate::config::PoolConfig;

/// Threshold/cooldown logic over a credential's health fields.
#[derive(Debug, Clone, Copy)]
pub struct HealthTracker {
    error_threshold: u32,
    cooldown_ms: u64,
}

impl HealthTracker {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            error_threshold: config.error_threshold,
            cooldown_ms: config.cooldown_millis(),
        }
    }

    /// Whether a post-increment error count triggers quarantine.
    pub fn crosses_threshold(&self, error_count: u32) -> bool {
        error_count >= self.error_threshold
    }

    /// Whether the credential may be handed to the selector right now.
    ///
    /// Disabled credentials are never selectable regardless of health. A
    /// quarantined credential counts once its cooldown has elapsed — the
    /// caller should heal it via `try_auto_recover` before selecting.
    pub fn is_selectable(&self, credential: &Credential, now_ms: u64) -> bool {
        credential.enabled && (credential.healthy || self.cooldown_elapsed(credential, now_ms))
    }

    /// Whether the cooldown period has passed since the last error.
    pub fn cooldown_elapsed(&self, credential: &Credential, now_ms: u64) -> bool {
        match credential.last_error_at {
            Some(at) => now_ms.saturating_sub(at) >= self.cooldown_ms,
            // Quarantined with no recorded error time: nothing to wait on.
            None => true,
        }
    }

    /// Automatic recovery: heal a quarantined credential whose cooldown
    /// has elapsed. Returns true if a transition happened.
    pub fn try_auto_recover(&self, credential: &mut Credential, now_ms: u64) -> bool {
        if credential.healthy || !self.cooldown_elapsed(credential, now_ms) {
            return false;
        }
        credential.healthy = true;
        credential.error_count = 0;
        info!(credential_id = %credential.id, "cooldown expired, credential healthy again");
        true
    }

    /// Manual recovery: unconditionally heal, regardless of cooldown.
    /// Returns true if the credential was quarantined.
    pub fn reset(&self, credential: &mut Credential) -> bool {
        let was_quarantined = !credential.healthy;
        credential.healthy = true;
        credential.error_count = 0;
        was_quarantined
    }
}
