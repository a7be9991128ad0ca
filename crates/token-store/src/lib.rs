//! Credential model and storage contract
//!
//! Defines the `Credential` row the engine operates on, the closed enums
//! persisted as strings at the store edge, and the `CredentialStore` /
//! `ProviderDirectory` collaborator traits. Ships `JsonFileStore`, a
//! JSON-file reference implementation with atomic writes, so the engine is
//! usable and testable without an external database.
//!
//! Credential lifecycle:
//! 1. Service encrypts the value and calls `insert`
//! 2. Selection reads `list_selectable` (enabled credentials; health
//!    filtering is the engine's job, the store cannot evaluate cooldowns)
//! 3. Failure reports go through `increment_error` (atomic under the
//!    store's own lock, no lost updates)
//! 4. `touch_last_used` is advisory and best-effort
//! 5. Migration rewrites `ciphertext` + `encryption_version` via `update`

pub mod error;
pub mod file;
pub mod model;
pub mod store;

pub use error::{Error, Result};
pub use file::JsonFileStore;
pub use model::{Credential, EncryptionVersion, ProviderPool, SelectionPolicy};
pub use store::{CredentialStore, ProviderDirectory, StaticProviders};
