//! # iCloud pull flow
//!
//! Drives the worker on behalf of one user:
//!
//! 1. Open the user's credentials from the vault
//! 2. `POST /sync` with them (and the stored session, if any)
//! 3. On `ok`, persist the renewed session and hand back the summary
//! 4. On `needs_2fa`, remember the challenge; the user answers it with
//!    [`IcloudSync::submit_two_factor`]
//!
//! The worker writes photos to the bucket; cataloging them is the
//! [`SyncOrchestrator`](crate::SyncOrchestrator)'s job.

use crate::challenge::{ChallengeRegistry, PendingChallenge};
use crate::error::{Result, SyncError};
use crate::worker::{WorkerClient, WorkerResponse, WorkerSyncSummary};
use bridge_traits::time::Clock;
use core_auth::CredentialVault;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcloudSyncOutcome {
    Completed(WorkerSyncSummary),
    NeedsTwoFactor(PendingChallenge),
}

pub struct IcloudSync {
    vault: CredentialVault,
    worker: WorkerClient,
    challenges: ChallengeRegistry,
}

impl IcloudSync {
    pub fn new(vault: CredentialVault, worker: WorkerClient, clock: Arc<dyn Clock>) -> Self {
        Self {
            vault,
            worker,
            challenges: ChallengeRegistry::new(clock),
        }
    }

    pub fn challenges(&self) -> &ChallengeRegistry {
        &self.challenges
    }

    /// Start a pull with the user's stored credentials.
    ///
    /// # Errors
    ///
    /// [`SyncError::NoCredentials`] when nothing is stored for `user_id`;
    /// vault and worker failures otherwise.
    #[instrument(skip(self))]
    pub async fn start(&self, user_id: &str, limit: Option<usize>) -> Result<IcloudSyncOutcome> {
        let credentials = self
            .vault
            .get_credentials(user_id)
            .await?
            .ok_or_else(|| SyncError::NoCredentials {
                user_id: user_id.to_string(),
            })?;

        let response = self.worker.start_sync(user_id, &credentials, limit).await?;
        self.settle(user_id, response).await
    }

    /// Answer a pending challenge with the user's verification code.
    ///
    /// # Errors
    ///
    /// [`SyncError::ChallengeExpired`] when this process issued the challenge
    /// and its window has closed; the worker is not contacted. Stale ids the
    /// process does not know are sent on and the worker's error comes back
    /// unchanged.
    #[instrument(skip(self, code))]
    pub async fn submit_two_factor(
        &self,
        user_id: &str,
        session_id: &str,
        code: &str,
    ) -> Result<IcloudSyncOutcome> {
        let session_id = session_id.trim();
        let code = code.trim();
        if session_id.is_empty() || code.is_empty() {
            return Err(SyncError::InvalidInput(
                "Session id and verification code are required".to_string(),
            ));
        }

        self.challenges.check(session_id, user_id).await?;

        let response = self
            .worker
            .verify_two_factor(user_id, session_id, code)
            .await?;
        self.challenges.resolve(session_id).await;
        self.settle(user_id, response).await
    }

    async fn settle(&self, user_id: &str, response: WorkerResponse) -> Result<IcloudSyncOutcome> {
        match response {
            WorkerResponse::Ok(summary) => {
                if let Some(session) = &summary.session {
                    // Not fatal: the worker has already pulled.
                    if let Err(e) = self.vault.save_session(user_id, session).await {
                        warn!(error = %e, "Could not persist renewed iCloud session");
                    }
                }
                info!(
                    imported = summary.imported,
                    skipped = summary.skipped,
                    failed = summary.errors.len(),
                    "iCloud pull completed"
                );
                Ok(IcloudSyncOutcome::Completed(summary))
            }
            WorkerResponse::NeedsTwoFactor { session_id } => {
                let challenge = self.challenges.register(&session_id, user_id).await;
                info!(session_id = %challenge.session_id, "iCloud requires two-factor verification");
                Ok(IcloudSyncOutcome::NeedsTwoFactor(challenge))
            }
        }
    }
}
