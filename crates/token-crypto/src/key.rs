//! Master key loading and generation
//!
//! A single 256-bit symmetric key encrypts every stored credential. Sources
//! are tried in order: env var, key file, generate-on-first-run. The chain
//! is modeled as `KeySource` values so a deployment can substitute a managed
//! secret store without touching cipher logic.
//!
//! The key file holds the key as base64 text with 0600 permissions. If the
//! file (and env var) are lost, every credential encrypted under the key is
//! permanently unrecoverable — there is no escrow and no recovery path.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngExt;
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Master key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Env var holding the base64-encoded master key.
pub const MASTER_KEY_ENV: &str = "TOKEN_POOL_MASTER_KEY";

/// 256-bit master key. Zeroized on drop, redacted in Debug.
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    /// Wrap raw key bytes (tests and external key stores).
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill(&mut bytes);
        Self(bytes)
    }

    /// Raw key bytes for cipher construction.
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| Error::InvalidKey(format!("base64 decode: {e}")))?;
        let bytes: [u8; KEY_LEN] = decoded
            .try_into()
            .map_err(|v: Vec<u8>| Error::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", v.len())))?;
        Ok(Self(bytes))
    }

    fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// One strategy for obtaining the master key.
///
/// `resolve` returns `Ok(None)` when the source has nothing to offer (env
/// var unset, file absent) so the chain can fall through; a source that
/// *has* material but can't produce a valid key is a hard error — silently
/// skipping a corrupt key file would generate a new key and orphan every
/// existing ciphertext.
pub enum KeySource {
    /// Base64 key from an environment variable.
    Env(String),
    /// Base64 key from a file.
    File(PathBuf),
    /// Generate a fresh key and persist it to the given path.
    Generate(PathBuf),
}

impl KeySource {
    /// Try to produce a key from this source.
    pub fn resolve(&self) -> Result<Option<MasterKey>> {
        match self {
            KeySource::Env(var) => match std::env::var(var) {
                Ok(encoded) => {
                    info!(source = "env", var, "master key loaded");
                    MasterKey::from_base64(&encoded).map(Some)
                }
                Err(_) => Ok(None),
            },
            KeySource::File(path) => {
                if !path.exists() {
                    return Ok(None);
                }
                let encoded = std::fs::read_to_string(path)
                    .map_err(|e| Error::Io(format!("reading {}: {e}", path.display())))?;
                info!(source = "file", path = %path.display(), "master key loaded");
                MasterKey::from_base64(&encoded).map(Some)
            }
            KeySource::Generate(path) => {
                let key = MasterKey::generate();
                persist_key(path, &key)?;
                warn!(
                    path = %path.display(),
                    "generated new master key; LOSING THIS FILE MAKES ALL STORED CREDENTIALS PERMANENTLY UNRECOVERABLE — back it up"
                );
                Ok(Some(key))
            }
        }
    }
}

/// Default key file path: `<config_dir>/token-pool/master.key`.
pub fn default_key_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| Error::KeyUnavailable("no user config directory".into()))?;
    Ok(base.join("token-pool").join("master.key"))
}

/// Load the master key through the default source chain:
/// env var → key file → generate-on-first-run.
///
/// Failure here is fatal at process initialization: no credential can be
/// encrypted or decrypted without the key.
pub fn load_master_key() -> Result<MasterKey> {
    let path = default_key_path()?;
    resolve_chain(&[
        KeySource::Env(MASTER_KEY_ENV.into()),
        KeySource::File(path.clone()),
        KeySource::Generate(path),
    ])
}

fn resolve_chain(sources: &[KeySource]) -> Result<MasterKey> {
    for source in sources {
        if let Some(key) = source.resolve()? {
            return Ok(key);
        }
    }
    Err(Error::KeyUnavailable("no key source produced a key".into()))
}

/// Write the key file with 0600 permissions, creating parent directories.
fn persist_key(path: &Path, key: &MasterKey) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Io(format!("creating {}: {e}", dir.display())))?;
    }
    std::fs::write(path, key.to_base64())
        .map_err(|e| Error::Io(format!("writing {}: {e}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| Error::Io(format!("setting key file permissions: {e}")))?;
    }

    Ok(())
}
