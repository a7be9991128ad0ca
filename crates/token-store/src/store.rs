//! Collaborator traits: credential persistence and provider lookup
//!
//! The engine talks to its row store through `CredentialStore` so the
//! persistence mechanics stay swappable (JSON file here, a database in the
//! desktop backend). `ProviderDirectory` supplies the per-provider policy
//! slice; provider CRUD itself is someone else's concern.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Credential, ProviderPool};

/// Persistence contract for credential rows.
///
/// `increment_error` must be atomic within the store (no lost updates
/// under concurrent failure reports); everything else tolerates
/// last-write-wins. Implementations must not require the engine to hold
/// any lock across calls.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Credential>>;

    /// Insert a new credential. Fails with `Conflict` if the id exists.
    async fn insert(&self, credential: Credential) -> Result<()>;

    /// Replace an existing credential. Fails with `NotFound` if absent.
    async fn update(&self, credential: Credential) -> Result<()>;

    /// Remove a credential, returning it if it existed.
    async fn remove(&self, id: &str) -> Result<Option<Credential>>;

    /// All credentials for a provider, in stable (creation) order.
    async fn list(&self, provider_id: &str) -> Result<Vec<Credential>>;

    /// Enabled credentials for a provider, in stable (creation) order.
    ///
    /// Health filtering (including cooldown eligibility) happens in the
    /// engine — the store has no clock or threshold configuration.
    async fn list_selectable(&self, provider_id: &str) -> Result<Vec<Credential>>;

    /// Atomically increment the error count and stamp `last_error_at`.
    /// Returns the post-increment count.
    async fn increment_error(&self, id: &str, now_ms: u64) -> Result<u32>;

    /// Reset the error count to zero. Does not touch `healthy`.
    async fn reset_error(&self, id: &str) -> Result<()>;

    /// Record a selection. Advisory; callers may dispatch this
    /// best-effort off the critical path.
    async fn touch_last_used(&self, id: &str, now_ms: u64) -> Result<()>;

    /// All credentials not yet on the current encryption version.
    async fn list_legacy_encryption(&self) -> Result<Vec<Credential>>;
}

/// Lookup of the selection-relevant slice of a Provider.
#[async_trait]
pub trait ProviderDirectory: Send + Sync {
    async fn pool(&self, provider_id: &str) -> Result<Option<ProviderPool>>;
}

/// Fixed in-memory provider directory for tests and the CLI.
#[derive(Debug, Default, Clone)]
pub struct StaticProviders {
    pools: HashMap<String, ProviderPool>,
}

impl StaticProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(mut self, provider_id: impl Into<String>, pool: ProviderPool) -> Self {
        self.pools.insert(provider_id.into(), pool);
        self
    }
}

#[async_trait]
impl ProviderDirectory for StaticProviders {
    async fn pool(&self, provider_id: &str) -> Result<Option<ProviderPool>> {
        Ok(self.pools.get(provider_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SelectionPolicy;

    #[tokio::test]
    async fn static_providers_returns_configured_pool() {
        let providers = StaticProviders::new().with_pool(
            "prov-1",
            ProviderPool {
                policy: SelectionPolicy::Weighted,
                fallback_on_error: true,
            },
        );

        let pool = providers.pool("prov-1").await.unwrap().unwrap();
        assert_eq!(pool.policy, SelectionPolicy::Weighted);
        assert!(pool.fallback_on_error);

        assert!(providers.pool("prov-2").await.unwrap().is_none());
    }
}
