//! Token pool engine: selection, health tracking, and credential migration
//!
//! Composes the cipher (`token-crypto`) and the store contract
//! (`token-store`) into the `TokenPoolService` façade the rest of the
//! backend calls. Selection is pure over a candidate snapshot; health is a
//! threshold/cooldown state machine persisted through the store; migration
//! brings legacy plaintext rows forward without a maintenance window.
//!
//! Credential lifecycle through the pool:
//! 1. `add_credential` encrypts the value and inserts the row
//! 2. `select_credential` loads enabled rows, heals expired cooldowns,
//!    filters to healthy, applies the provider's policy, decrypts the
//!    winner, and records `last_used_at` best-effort off the critical path
//! 3. Downstream failure → `report_failure` (atomic increment, threshold
//!    quarantine, optional fallback re-selection)
//! 4. Cooldown expiry heals automatically; `recover_all` heals manually
//! 5. `run_migration` re-encrypts any row not on the current scheme

pub mod config;
pub mod error;
pub mod health;
pub mod migrate;
pub mod select;
pub mod service;

pub use config::PoolConfig;
pub use error::{Error, Result};
pub use health::HealthTracker;
pub use migrate::{MigrationCoordinator, MigrationReport};
pub use service::{FailureOutcome, OpContext, SelectedCredential, TokenPoolService};
