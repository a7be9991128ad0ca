//! Batch migration of legacy credentials to the current encryption scheme
//!
//! Fetches every row not on the current `encryption_version` and brings it
//! forward: values already in envelope form (tag missing but content
//! ciphertext-shaped) get a version bump only; plaintext values are
//! encrypted, updating `ciphertext` and `encryption_version` together.
//!
//! Items are processed independently — one failure is logged (id only,
//! never the value) and counted, and the batch continues. The run is
//! idempotent and only ever moves a row from legacy to current, so it is
//! safe to repeat and safe alongside live selection traffic. No lock is
//! held across items.

use std::sync::Arc;

use token_crypto::{CredentialCipher, is_encrypted};
use token_store::{CredentialStore, EncryptionVersion};
use tracing::{info, warn};

/// Outcome of one migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Re-encrypts stored credentials onto the current scheme.
pub struct MigrationCoordinator {
    store: Arc<dyn CredentialStore>,
    cipher: Arc<CredentialCipher>,
}

impl MigrationCoordinator {
    pub fn new(store: Arc<dyn CredentialStore>, cipher: Arc<CredentialCipher>) -> Self {
        Self { store, cipher }
    }

    /// Run one migration pass over all legacy rows.
    ///
    /// Returns the per-batch counts; only a failure to *list* the legacy
    /// rows aborts the run.
    pub async fn run(&self) -> token_store::Result<MigrationReport> {
        let legacy = self.store.list_legacy_encryption().await?;
        let total = legacy.len();
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for mut credential in legacy {
            let outcome = if is_encrypted(&credential.ciphertext) {
                // Version tag lagging behind content that is already on the
                // current envelope: bump the tag only.
                credential.encryption_version = EncryptionVersion::CURRENT;
                self.store.update(credential.clone()).await.map_err(|e| e.to_string())
            } else {
                match self.cipher.encrypt(&credential.ciphertext) {
                    Ok(envelope) => {
                        credential.ciphertext = envelope;
                        credential.encryption_version = EncryptionVersion::CURRENT;
                        self.store.update(credential.clone()).await.map_err(|e| e.to_string())
                    }
                    Err(e) => Err(e.to_string()),
                }
            };

            match outcome {
                Ok(()) => succeeded += 1,
                Err(error) => {
                    failed += 1;
                    warn!(credential_id = %credential.id, error, "credential migration failed");
                }
            }
        }

        let report = MigrationReport {
            total,
            succeeded,
            failed,
        };
        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            "credential migration pass complete"
        );
        Ok(report)
    }
}
