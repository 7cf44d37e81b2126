//! AES-256-GCM sealing for stored secrets
//!
//! Every value is sealed under a fresh random 96-bit nonce and stored as three
//! base64 fields joined by `:`:
//!
//! ```text
//! base64(nonce):base64(tag):base64(ciphertext)
//! ```
//!
//! Payloads are checked structurally (field count, base64, nonce and tag
//! length) before any decryption is attempted.

use crate::error::{AuthError, Result};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

const SEPARATOR: char = ':';

/// 256-bit vault key.
#[derive(Clone)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        <[u8; KEY_LEN]>::try_from(bytes).map(Self).map_err(|_| {
            AuthError::InvalidKey(format!("expected {} bytes, got {}", KEY_LEN, bytes.len()))
        })
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Seals and opens vault values under one key.
#[derive(Clone)]
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    pub fn new(key: &EncryptionKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0)),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| AuthError::EncryptionFailed)?;

        // aes-gcm appends the tag to the ciphertext.
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        Ok(format!(
            "{}{sep}{}{sep}{}",
            STANDARD.encode(nonce),
            STANDARD.encode(tag),
            STANDARD.encode(ciphertext),
            sep = SEPARATOR
        ))
    }

    pub fn decrypt(&self, payload: &str) -> Result<String> {
        let fields: Vec<&str> = payload.split(SEPARATOR).collect();
        let [nonce, tag, ciphertext] = fields.as_slice() else {
            return Err(AuthError::DecryptionFailed(format!(
                "expected 3 fields, found {}",
                fields.len()
            )));
        };

        let nonce = decode_field(nonce, "nonce")?;
        if nonce.len() != NONCE_LEN {
            return Err(AuthError::DecryptionFailed(format!(
                "nonce must be {} bytes, got {}",
                NONCE_LEN,
                nonce.len()
            )));
        }

        let tag = decode_field(tag, "tag")?;
        if tag.len() != TAG_LEN {
            return Err(AuthError::DecryptionFailed(format!(
                "tag must be {} bytes, got {}",
                TAG_LEN,
                tag.len()
            )));
        }

        let mut sealed = decode_field(ciphertext, "ciphertext")?;
        sealed.extend_from_slice(&tag);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce), sealed.as_slice())
            .map_err(|_| AuthError::DecryptionFailed("authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| AuthError::DecryptionFailed("plaintext is not UTF-8".to_string()))
    }
}

fn decode_field(value: &str, name: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| AuthError::DecryptionFailed(format!("invalid base64 in {}: {}", name, e)))
}
