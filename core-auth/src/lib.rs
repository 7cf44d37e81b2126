//! # Authentication Module
//!
//! Secrets and tokens for the iCloud import path.
//!
//! ## Overview
//!
//! - [`CredentialVault`]: AES-256-GCM sealed Apple ID, app password and session
//!   data, persisted through the catalog's account repository
//! - [`WorkerAuthBridge`]: short-lived HS256 tokens for the iCloud worker, and
//!   the worker's normalized base URL
//!
//! Plaintext secrets never appear in `Debug` output or logs.

pub mod cipher;
pub mod error;
pub mod types;
pub mod vault;
pub mod worker;

pub use cipher::{CredentialCipher, EncryptionKey};
pub use error::{AuthError, Result};
pub use types::{Credentials, SessionArtifact, WorkerClaims};
pub use vault::CredentialVault;
pub use worker::{WorkerAuthBridge, TOKEN_TTL_SECS, WORKER_AUDIENCE};
