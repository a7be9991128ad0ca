//! Authenticated encryption of credential values
//!
//! Format: `enc:v1:` marker followed by standard base64 of
//! `[12-byte nonce][ciphertext + 16-byte tag]`. A fresh random nonce is
//! drawn from the OS RNG on every encrypt call; a nonce must never be
//! reused under the same key. GCM-SIV keeps even an accidental reuse from
//! being catastrophic, but the engine still treats reuse as forbidden.
//!
//! Decryption of a value without the marker returns it unchanged as legacy
//! plaintext (pre-migration data) and logs a warning — the migration has
//! not run to completion. A value *with* the marker that fails
//! authentication is a hard error; there is no plaintext fallback on that
//! path.

use aes_gcm_siv::{
    Aes256GcmSiv, Nonce,
    aead::{Aead, KeyInit, OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use common::Secret;
use tracing::warn;

use crate::error::{Error, Result};
use crate::key::MasterKey;

/// Scheme/version marker prefixed to every encrypted value.
pub const SCHEME_MARKER: &str = "enc:v1:";

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

/// Whether a stored value carries the current encryption envelope.
///
/// Pure marker check; does not validate the payload.
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(SCHEME_MARKER)
}

/// AEAD cipher over credential values, bound to one master key.
pub struct CredentialCipher {
    cipher: Aes256GcmSiv,
}

impl CredentialCipher {
    /// Build a cipher from the loaded master key.
    pub fn new(key: &MasterKey) -> Result<Self> {
        let cipher = Aes256GcmSiv::new_from_slice(key.bytes())
            .map_err(|e| Error::InvalidKey(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Encrypt a plaintext credential value into the stored string form.
    ///
    /// Every call draws a fresh random nonce, so encrypting the same
    /// plaintext twice yields different outputs.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        aes_gcm_siv::aead::rand_core::RngCore::fill_bytes(&mut OsRng, &mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| Error::Encrypt(e.to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);

        Ok(format!("{SCHEME_MARKER}{}", BASE64.encode(payload)))
    }

    /// Decrypt a stored value back to the plaintext credential.
    ///
    /// Values without the scheme marker are legacy plaintext and are
    /// returned unchanged (with a warning). Values with the marker must
    /// authenticate; tampering, corruption, or a wrong key all fail hard.
    pub fn decrypt(&self, stored: &str) -> Result<Secret<String>> {
        let Some(encoded) = stored.strip_prefix(SCHEME_MARKER) else {
            warn!("decrypting legacy plaintext credential, run migration to encrypt at rest");
            return Ok(Secret::new(stored.to_owned()));
        };

        let payload = BASE64
            .decode(encoded)
            .map_err(|e| Error::Malformed(format!("base64 decode: {e}")))?;
        if payload.len() < NONCE_SIZE + TAG_SIZE {
            return Err(Error::Malformed(format!(
                "payload too short: {} bytes",
                payload.len()
            )));
        }

        let nonce_bytes: [u8; NONCE_SIZE] = payload[..NONCE_SIZE]
            .try_into()
            .expect("slice length matches NONCE_SIZE");
        let nonce = Nonce::from(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(&nonce, &payload[NONCE_SIZE..])
            .map_err(|_| Error::AuthenticationFailed)?;

        let plaintext =
            String::from_utf8(plaintext).map_err(|_| Error::Malformed("not utf-8".into()))?;
        Ok(Secret::new(plaintext))
    }
}
