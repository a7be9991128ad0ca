//! Credential row and the closed enums persisted as strings
//!
//! The store keeps policy names and version tags as plain strings; inside
//! the engine they are closed enums so an unknown tag is a parse error at
//! the store edge, not a silent misbehavior deep in selection.

use serde::{Deserialize, Serialize};

/// Which cipher scheme produced a credential's `ciphertext`.
///
/// `Plaintext` is only ever produced by pre-migration data — the engine
/// itself never writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionVersion {
    Plaintext,
    V1,
}

impl EncryptionVersion {
    /// The version the engine writes today.
    pub const CURRENT: EncryptionVersion = EncryptionVersion::V1;

    pub fn is_current(self) -> bool {
        self == Self::CURRENT
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EncryptionVersion::Plaintext => "plaintext",
            EncryptionVersion::V1 => "v1",
        }
    }
}

/// Load-distribution policy for a provider's credential pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    RoundRobin,
    Weighted,
    Random,
    LeastUsed,
}

impl SelectionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionPolicy::RoundRobin => "round_robin",
            SelectionPolicy::Weighted => "weighted",
            SelectionPolicy::Random => "random",
            SelectionPolicy::LeastUsed => "least_used",
        }
    }
}

impl std::str::FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "round_robin" => Ok(SelectionPolicy::RoundRobin),
            "weighted" => Ok(SelectionPolicy::Weighted),
            "random" => Ok(SelectionPolicy::Random),
            "least_used" => Ok(SelectionPolicy::LeastUsed),
            other => Err(format!("unknown selection policy: {other}")),
        }
    }
}

/// The slice of the external Provider entity the engine needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProviderPool {
    pub policy: SelectionPolicy,
    /// When true, a reported failure triggers one replacement selection
    /// excluding the failed credential.
    pub fallback_on_error: bool,
}

/// A stored credential (token) belonging to exactly one provider.
///
/// Timestamps are unix milliseconds. `healthy`/`error_count` are
/// system-maintained; `enabled` is the operator kill switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub provider_id: String,
    /// Stored credential material: `enc:v1:...` envelope, or raw secret
    /// for legacy pre-migration rows.
    pub ciphertext: String,
    pub encryption_version: EncryptionVersion,
    /// Human label, unique within the provider (case-sensitive).
    pub alias: String,
    /// Weighted-policy weight, always >= 1.
    pub weight: u32,
    pub enabled: bool,
    pub healthy: bool,
    pub error_count: u32,
    pub last_error_at: Option<u64>,
    pub last_used_at: Option<u64>,
    /// Unix millis at creation; gives listings a stable order.
    pub created_at: u64,
}

impl Credential {
    /// Build a new credential row with a fresh uuid-v4 id.
    ///
    /// `alias` defaults to a prefix of the id when not supplied. The
    /// caller (service) is responsible for validating the plaintext and
    /// encrypting it before construction.
    pub fn new(
        provider_id: impl Into<String>,
        alias: Option<String>,
        weight: u32,
        ciphertext: String,
        now_ms: u64,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let alias = alias.unwrap_or_else(|| format!("token-{}", &id[..8]));
        Self {
            id,
            provider_id: provider_id.into(),
            ciphertext,
            encryption_version: EncryptionVersion::CURRENT,
            alias,
            weight,
            enabled: true,
            healthy: true,
            error_count: 0,
            last_error_at: None,
            last_used_at: None,
            created_at: now_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_credential_starts_healthy_and_enabled() {
        let cred = Credential::new("prov-1", None, 1, "enc:v1:abc".into(), 1000);
        assert!(cred.enabled);
        assert!(cred.healthy);
        assert_eq!(cred.error_count, 0);
        assert_eq!(cred.encryption_version, EncryptionVersion::V1);
        assert!(cred.last_used_at.is_none());
        assert!(cred.alias.starts_with("token-"));
    }

    #[test]
    fn explicit_alias_is_kept() {
        let cred = Credential::new("prov-1", Some("primary".into()), 3, "c".into(), 0);
        assert_eq!(cred.alias, "primary");
        assert_eq!(cred.weight, 3);
    }

    #[test]
    fn encryption_version_serializes_as_string() {
        let json = serde_json::to_string(&EncryptionVersion::Plaintext).unwrap();
        assert_eq!(json, r#""plaintext""#);
        let json = serde_json::to_string(&EncryptionVersion::V1).unwrap();
        assert_eq!(json, r#""v1""#);
        assert!(!EncryptionVersion::Plaintext.is_current());
        assert!(EncryptionVersion::V1.is_current());
    }

    #[test]
    fn policy_round_trips_through_strings() {
        for policy in [
            SelectionPolicy::RoundRobin,
            SelectionPolicy::Weighted,
            SelectionPolicy::Random,
            SelectionPolicy::LeastUsed,
        ] {
            let parsed: SelectionPolicy = policy.as_str().parse().unwrap();
            assert_eq!(parsed, policy);
        }
        assert!("priority".parse::<SelectionPolicy>().is_err());
    }

    #[test]
    fn unknown_policy_string_fails_deserialization() {
        let result: std::result::Result<SelectionPolicy, _> =
            serde_json::from_str(r#""sticky""#);
        assert!(result.is_err());
    }
}
