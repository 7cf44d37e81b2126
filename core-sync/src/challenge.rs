//! Pending two-factor challenges
//!
//! When the worker answers `needs_2fa`, the session id it hands back is
//! remembered here with a validity window. A code submitted after the window
//! closes is rejected locally instead of being sent to the worker. Session ids
//! this process never issued are not judged; the worker decides.

use crate::error::{Result, SyncError};
use bridge_traits::time::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// How long a verification code may be submitted after the worker asked for it.
pub const CHALLENGE_TTL_SECS: i64 = 10 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChallenge {
    pub session_id: String,
    pub user_id: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl PendingChallenge {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

pub struct ChallengeRegistry {
    pending: Mutex<HashMap<String, PendingChallenge>>,
    clock: Arc<dyn Clock>,
}

impl ChallengeRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Remember a challenge the worker just issued for `user_id`.
    pub async fn register(&self, session_id: &str, user_id: &str) -> PendingChallenge {
        let now = self.clock.unix_timestamp();
        let challenge = PendingChallenge {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            issued_at: now,
            expires_at: now + CHALLENGE_TTL_SECS,
        };

        let mut pending = self.pending.lock().await;
        pending.retain(|_, c| !c.is_expired(now));
        pending.insert(session_id.to_string(), challenge.clone());
        debug!(session_id, expires_at = challenge.expires_at, "Registered two-factor challenge");
        challenge
    }

    /// Decide whether a code for `session_id` may go to the worker.
    ///
    /// # Errors
    ///
    /// - [`SyncError::ChallengeExpired`] for a known challenge past its window;
    ///   the challenge is forgotten.
    /// - [`SyncError::InvalidInput`] when the challenge was issued to another user.
    pub async fn check(&self, session_id: &str, user_id: &str) -> Result<()> {
        let now = self.clock.unix_timestamp();
        let mut pending = self.pending.lock().await;

        let Some(challenge) = pending.get(session_id) else {
            return Ok(());
        };

        if challenge.is_expired(now) {
            pending.remove(session_id);
            return Err(SyncError::ChallengeExpired {
                session_id: session_id.to_string(),
            });
        }
        if challenge.user_id != user_id {
            return Err(SyncError::InvalidInput(format!(
                "Two-factor session {} belongs to another user",
                session_id
            )));
        }
        Ok(())
    }

    /// Forget a challenge once the worker has accepted its code.
    pub async fn resolve(&self, session_id: &str) -> Option<PendingChallenge> {
        self.pending.lock().await.remove(session_id)
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
