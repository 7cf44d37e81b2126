//! Worker Auth Bridge
//!
//! Issues the short-lived bearer tokens the iCloud worker accepts, and knows
//! where the worker lives. Holds configuration only.
//!
//! Tokens are HS256 JWTs with audience [`WORKER_AUDIENCE`], the user id as
//! subject, and a [`TOKEN_TTL_SECS`] lifetime.

use crate::error::{AuthError, Result};
use crate::types::WorkerClaims;
use bridge_traits::time::Clock;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub const WORKER_AUDIENCE: &str = "icloud-worker";
pub const TOKEN_TTL_SECS: i64 = 5 * 60;

#[derive(Clone)]
pub struct WorkerAuthBridge {
    base_url: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl WorkerAuthBridge {
    /// # Errors
    ///
    /// [`AuthError::Configuration`] when the URL or the secret is blank.
    pub fn new(base_url: &str, secret: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(AuthError::Configuration(
                "ICLOUD_WORKER_URL is not configured".to_string(),
            ));
        }
        if secret.is_empty() {
            return Err(AuthError::Configuration(
                "WORKER_JWT_SECRET is not configured".to_string(),
            ));
        }

        Ok(Self {
            base_url: base_url.to_string(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            clock,
        })
    }

    /// Worker location without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a worker path such as `/sync/2fa`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn issue_token(&self, user_id: &str) -> Result<String> {
        let issued_at = self.clock.unix_timestamp();
        let claims = WorkerClaims {
            sub: user_id.to_string(),
            aud: WORKER_AUDIENCE.to_string(),
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECS,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        debug!(user_id, expires_at = claims.exp, "Issued worker token");
        Ok(token)
    }

    /// Check signature, audience and expiry the way the worker does.
    ///
    /// Expiry is measured against this bridge's clock.
    pub fn verify_token(&self, token: &str) -> Result<WorkerClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[WORKER_AUDIENCE]);
        validation.validate_exp = false;

        let claims = jsonwebtoken::decode::<WorkerClaims>(token, &self.decoding_key, &validation)?.claims;
        if self.clock.unix_timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }
}

impl fmt::Debug for WorkerAuthBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerAuthBridge")
            .field("base_url", &self.base_url)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
