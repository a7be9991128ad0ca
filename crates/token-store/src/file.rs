//! JSON-file credential store
//!
//! Reference `CredentialStore` backed by a JSON file mapping credential ids
//! to rows. All writes use atomic temp-file + rename to prevent corruption
//! on crash, and a tokio Mutex serializes mutations — which also makes
//! `increment_error` atomic (no lost updates under concurrent failure
//! reports). Reads clone the in-memory state under a brief lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::Credential;
use crate::store::CredentialStore;

/// Thread-safe JSON-file credential store.
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<HashMap<String, Credential>>,
}

impl JsonFileStore {
    /// Load credentials from the given file path.
    ///
    /// If the file doesn't exist, creates it as `{}` (cold start with zero
    /// credentials).
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let credentials: HashMap<String, Credential> = serde_json::from_str(&contents)
                .map_err(|e| Error::Parse(format!("parsing credential file: {e}")))?;
            info!(path = %path.display(), credentials = credentials.len(), "loaded credential store");
            credentials
        } else {
            info!(path = %path.display(), "credential file not found, starting with empty store");
            let state = HashMap::new();
            write_atomic(&path, &state).await?;
            state
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Number of stored credentials.
    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn sorted(mut rows: Vec<Credential>) -> Vec<Credential> {
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        rows
    }
}

#[async_trait]
impl CredentialStore for JsonFileStore {
    async fn get(&self, id: &str) -> Result<Option<Credential>> {
        Ok(self.state.lock().await.get(id).cloned())
    }

    async fn insert(&self, credential: Credential) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.contains_key(&credential.id) {
            return Err(Error::Conflict(format!(
                "credential {} already exists",
                credential.id
            )));
        }
        debug!(credential_id = %credential.id, provider_id = %credential.provider_id, "inserted credential");
        state.insert(credential.id.clone(), credential);
        write_atomic(&self.path, &state).await
    }

    async fn update(&self, credential: Credential) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.contains_key(&credential.id) {
            return Err(Error::NotFound(credential.id));
        }
        state.insert(credential.id.clone(), credential);
        write_atomic(&self.path, &state).await
    }

    async fn remove(&self, id: &str) -> Result<Option<Credential>> {
        let mut state = self.state.lock().await;
        let removed = state.remove(id);
        if removed.is_some() {
            debug!(credential_id = id, "removed credential");
            write_atomic(&self.path, &state).await?;
        }
        Ok(removed)
    }

    async fn list(&self, provider_id: &str) -> Result<Vec<Credential>> {
        let state = self.state.lock().await;
        Ok(Self::sorted(
            state
                .values()
                .filter(|c| c.provider_id == provider_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_selectable(&self, provider_id: &str) -> Result<Vec<Credential>> {
        let state = self.state.lock().await;
        Ok(Self::sorted(
            state
                .values()
                .filter(|c| c.provider_id == provider_id && c.enabled)
                .cloned()
                .collect(),
        ))
    }

    async fn increment_error(&self, id: &str, now_ms: u64) -> Result<u32> {
        let mut state = self.state.lock().await;
        let credential = state
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        credential.error_count += 1;
        credential.last_error_at = Some(now_ms);
        let count = credential.error_count;
        write_atomic(&self.path, &state).await?;
        Ok(count)
    }

    async fn reset_error(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let credential = state
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        credential.error_count = 0;
        write_atomic(&self.path, &state).await
    }

    async fn touch_last_used(&self, id: &str, now_ms: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        let credential = state
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        credential.last_used_at = Some(now_ms);
        write_atomic(&self.path, &state).await
    }

    async fn list_legacy_encryption(&self) -> Result<Vec<Credential>> {
        let state = self.state.lock().await;
        Ok(Self::sorted(
            state
                .values()
                .filter(|c| !c.encryption_version.is_current())
                .cloned()
                .collect(),
        ))
    }
}

/// Write the credential map to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. Sets 0600 permissions since rows hold credential material.
async fn write_atomic(path: &Path, data: &HashMap<String, Credential>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Parse(format!("serializing credentials: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credentials");
    Ok(())
}
