//! Credential encryption for the token pool engine
//!
//! Authenticated encryption (AES-256-GCM-SIV) of credential values plus
//! master key lifecycle. This crate is a standalone library with no
//! dependency on the pool or store — it can be tested and used
//! independently.
//!
//! Stored format: `enc:v1:<base64(nonce || ciphertext_with_tag)>`. Anything
//! without the `enc:v1:` marker is treated as legacy plaintext left behind
//! by pre-encryption deployments; the migration moves such values forward.
//!
//! Key resolution order:
//! 1. `TOKEN_POOL_MASTER_KEY` env var (base64, 32 bytes)
//! 2. key file under the per-user config directory
//! 3. generate on first run and persist to that file
//!
//! Losing the key file makes every stored credential permanently
//! unrecoverable. There is no escrow.

pub mod cipher;
pub mod error;
pub mod key;

pub use cipher::{CredentialCipher, SCHEME_MARKER, is_encrypted};
pub use error::{Error, Result};
pub use key::{KEY_LEN, KeySource, MasterKey, MASTER_KEY_ENV, default_key_path, load_master_key};
