//! Plaintext credential types handed out by the vault.
//!
//! `Debug` never prints secret material.

use core_runtime::logging::redact_if_sensitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session file produced by the worker after a successful sign-in.
///
/// Serialized as `{file_name, data}` on the worker wire.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionArtifact {
    pub file_name: String,
    pub data: String,
}

impl SessionArtifact {
    pub fn new(file_name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}

impl fmt::Debug for SessionArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionArtifact")
            .field("file_name", &self.file_name)
            .field("data", &"[REDACTED]")
            .finish()
    }
}

/// Decrypted iCloud credentials for one user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub apple_id: String,
    pub app_password: String,
    pub session: Option<SessionArtifact>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("apple_id", &redact_if_sensitive("apple_id", &self.apple_id))
            .field("app_password", &"[REDACTED]")
            .field("session", &self.session)
            .finish()
    }
}

/// Claims carried by a worker token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerClaims {
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}
