//! Token pool façade
//!
//! Composes the store, provider directory, cipher, and health tracker into
//! the operations session orchestration and admin callers use. Every
//! operation takes an explicit `OpContext` — there is no ambient
//! per-request state.
//!
//! Concurrency: the engine holds no lock across store calls. Two
//! concurrent selections may return the same credential (soft fairness);
//! `last_used_at` is advisory and written by a spawned task whose failure
//! is logged and swallowed. Error-count increments are atomic inside the
//! store; the quarantine write that may follow is last-write-wins.

use std::sync::Arc;

use common::Secret;
use token_crypto::CredentialCipher;
use token_store::{Credential, CredentialStore, ProviderDirectory};
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::health::HealthTracker;
use crate::migrate::{MigrationCoordinator, MigrationReport};
use crate::select;

/// Explicit per-call context, threaded through instead of any
/// thread-bound "current user" holder.
#[derive(Debug, Clone)]
pub struct OpContext {
    actor: String,
}

impl OpContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
        }
    }

    /// Context for engine-internal work (startup migration, maintenance).
    pub fn system() -> Self {
        Self::new("system")
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }
}

/// A selected credential with its decrypted value, ready for a session.
#[derive(Debug)]
pub struct SelectedCredential {
    pub id: String,
    pub provider_id: String,
    pub alias: String,
    pub value: Secret<String>,
}

/// Result of a failure report.
#[derive(Debug)]
pub struct FailureOutcome {
    /// Whether this report pushed the credential over the threshold.
    pub quarantined: bool,
    /// Replacement selection, present when the provider has
    /// `fallback_on_error` set and another credential was available.
    pub replacement: Option<SelectedCredential>,
}

/// Façade over credential storage, selection, health, and migration.
pub struct TokenPoolService {
    store: Arc<dyn CredentialStore>,
    providers: Arc<dyn ProviderDirectory>,
    cipher: Arc<CredentialCipher>,
    tracker: HealthTracker,
}

impl TokenPoolService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        providers: Arc<dyn ProviderDirectory>,
        cipher: Arc<CredentialCipher>,
        config: &PoolConfig,
    ) -> Self {
        Self {
            store,
            providers,
            cipher,
            tracker: HealthTracker::new(config),
        }
    }

    /// Add a credential to a provider's pool, encrypting the value
    /// immediately. The plaintext never reaches the store.
    pub async fn add_credential(
        &self,
        ctx: &OpContext,
        provider_id: &str,
        alias: Option<String>,
        weight: u32,
        plaintext: &str,
    ) -> Result<Credential> {
        if plaintext.is_empty() {
            return Err(Error::Validation("credential value must not be empty".into()));
        }
        if weight < 1 {
            return Err(Error::Validation("weight must be at least 1".into()));
        }
        if self.providers.pool(provider_id).await?.is_none() {
            return Err(Error::UnknownProvider(provider_id.to_string()));
        }
        if let Some(alias) = &alias {
            let existing = self.store.list(provider_id).await?;
            if existing.iter().any(|c| &c.alias == alias) {
                return Err(Error::Validation(format!(
                    "alias {alias} already in use for this provider"
                )));
            }
        }

        let envelope = self.cipher.encrypt(plaintext)?;
        let credential = Credential::new(provider_id, alias, weight, envelope, common::now_millis());
        self.store.insert(credential.clone()).await?;
        info!(
            actor = %ctx.actor,
            provider_id,
            credential_id = %credential.id,
            alias = %credential.alias,
            "credential added"
        );
        Ok(credential)
    }

    /// Select a credential for a new session against the provider.
    ///
    /// Loads enabled credentials, heals expired cooldowns, filters to
    /// healthy, applies the provider's policy, and decrypts the winner.
    pub async fn select_credential(
        &self,
        ctx: &OpContext,
        provider_id: &str,
    ) -> Result<SelectedCredential> {
        self.select_excluding(ctx, provider_id, None).await
    }

    async fn select_excluding(
        &self,
        ctx: &OpContext,
        provider_id: &str,
        exclude: Option<&str>,
    ) -> Result<SelectedCredential> {
        let pool = self
            .providers
            .pool(provider_id)
            .await?
            .ok_or_else(|| Error::UnknownProvider(provider_id.to_string()))?;

        let now = common::now_millis();
        let rows = self.store.list_selectable(provider_id).await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for mut credential in rows {
            if self.tracker.try_auto_recover(&mut credential, now) {
                // Persist the healing best-effort; the in-memory copy is
                // already eligible either way.
                if let Err(e) = self.store.update(credential.clone()).await {
                    warn!(credential_id = %credential.id, error = %e, "failed to persist auto-recovery");
                }
            }
            if self.tracker.is_selectable(&credential, now)
                && exclude != Some(credential.id.as_str())
            {
                candidates.push(credential);
            }
        }

        let winner = select::select(&candidates, pool.policy).ok_or_else(|| {
            debug!(actor = %ctx.actor, provider_id, "no selectable credential");
            Error::NoCredentialAvailable {
                provider_id: provider_id.to_string(),
            }
        })?;

        let value = self.cipher.decrypt(&winner.ciphertext)?;

        // Advisory rotation hint, dispatched off the critical path. A
        // failed write must not fail the selection.
        let store = Arc::clone(&self.store);
        let winner_id = winner.id.clone();
        tokio::spawn(async move {
            if let Err(e) = store.touch_last_used(&winner_id, common::now_millis()).await {
                warn!(credential_id = %winner_id, error = %e, "failed to record last-used time");
            }
        });

        info!(
            actor = %ctx.actor,
            provider_id,
            credential_id = %winner.id,
            policy = pool.policy.as_str(),
            "credential selected"
        );
        Ok(SelectedCredential {
            id: winner.id.clone(),
            provider_id: winner.provider_id.clone(),
            alias: winner.alias.clone(),
            value,
        })
    }

    /// Report a downstream failure for a credential.
    ///
    /// The increment is atomic at the store; crossing the threshold
    /// quarantines the credential. When the provider opts into
    /// `fallback_on_error`, one replacement selection excluding the failed
    /// credential is attempted and returned in the outcome.
    pub async fn report_failure(
        &self,
        ctx: &OpContext,
        credential_id: &str,
    ) -> Result<FailureOutcome> {
        let mut credential = self
            .store
            .get(credential_id)
            .await?
            .ok_or_else(|| Error::NotFound(credential_id.to_string()))?;

        let now = common::now_millis();
        let count = self.store.increment_error(credential_id, now).await?;

        let mut quarantined = false;
        if credential.healthy && self.tracker.crosses_threshold(count) {
            credential.error_count = count;
            credential.last_error_at = Some(now);
            credential.healthy = false;
            self.store.update(credential.clone()).await?;
            warn!(
                actor = %ctx.actor,
                credential_id,
                error_count = count,
                "credential quarantined"
            );
            quarantined = true;
        } else {
            debug!(actor = %ctx.actor, credential_id, error_count = count, "failure recorded");
        }

        let mut replacement = None;
        if let Some(pool) = self.providers.pool(&credential.provider_id).await? {
            if pool.fallback_on_error {
                replacement = match self
                    .select_excluding(ctx, &credential.provider_id, Some(credential_id))
                    .await
                {
                    Ok(selected) => Some(selected),
                    Err(Error::NoCredentialAvailable { .. }) => None,
                    Err(e) => return Err(e),
                };
            }
        }

        Ok(FailureOutcome {
            quarantined,
            replacement,
        })
    }

    /// Report a successful downstream call: clears the error streak. A
    /// credential already quarantined stays quarantined until cooldown
    /// expiry or an explicit recovery.
    pub async fn report_success(&self, ctx: &OpContext, credential_id: &str) -> Result<()> {
        if self.store.get(credential_id).await?.is_none() {
            return Err(Error::NotFound(credential_id.to_string()));
        }
        self.store.reset_error(credential_id).await?;
        debug!(actor = %ctx.actor, credential_id, "success reported, error streak cleared");
        Ok(())
    }

    /// Manually heal every quarantined credential of a provider,
    /// regardless of cooldown. Returns how many were healed.
    pub async fn recover_all(&self, ctx: &OpContext, provider_id: &str) -> Result<usize> {
        let rows = self.store.list(provider_id).await?;
        let mut healed = 0usize;
        for mut credential in rows {
            if self.tracker.reset(&mut credential) {
                self.store.update(credential).await?;
                healed += 1;
            }
        }
        info!(actor = %ctx.actor, provider_id, healed, "manual recovery");
        Ok(healed)
    }

    /// Replace a credential's value, re-encrypting under the current
    /// scheme and bumping the version tag.
    pub async fn rotate_value(
        &self,
        ctx: &OpContext,
        credential_id: &str,
        new_plaintext: &str,
    ) -> Result<()> {
        if new_plaintext.is_empty() {
            return Err(Error::Validation("credential value must not be empty".into()));
        }
        let mut credential = self
            .store
            .get(credential_id)
            .await?
            .ok_or_else(|| Error::NotFound(credential_id.to_string()))?;

        credential.ciphertext = self.cipher.encrypt(new_plaintext)?;
        credential.encryption_version = token_store::EncryptionVersion::CURRENT;
        self.store.update(credential).await?;
        info!(actor = %ctx.actor, credential_id, "credential value rotated");
        Ok(())
    }

    /// Operator kill switch.
    pub async fn set_enabled(
        &self,
        ctx: &OpContext,
        credential_id: &str,
        enabled: bool,
    ) -> Result<()> {
        let mut credential = self
            .store
            .get(credential_id)
            .await?
            .ok_or_else(|| Error::NotFound(credential_id.to_string()))?;
        credential.enabled = enabled;
        self.store.update(credential).await?;
        info!(actor = %ctx.actor, credential_id, enabled, "credential enabled flag set");
        Ok(())
    }

    /// Delete a credential.
    pub async fn remove_credential(&self, ctx: &OpContext, credential_id: &str) -> Result<()> {
        if self.store.remove(credential_id).await?.is_none() {
            return Err(Error::NotFound(credential_id.to_string()));
        }
        info!(actor = %ctx.actor, credential_id, "credential removed");
        Ok(())
    }

    /// Run one migration pass bringing legacy rows to the current scheme.
    pub async fn run_migration(&self, ctx: &OpContext) -> Result<MigrationReport> {
        info!(actor = %ctx.actor, "starting credential migration");
        let coordinator =
            MigrationCoordinator::new(Arc::clone(&self.store), Arc::clone(&self.cipher));
        Ok(coordinator.run().await?)
    }
}
