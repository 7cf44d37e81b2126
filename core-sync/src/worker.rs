//! iCloud worker HTTP client
//!
//! The worker pulls photos out of iCloud into the bucket. This client speaks
//! its two endpoints:
//!
//! - `POST /sync` with the user's credentials and optional session
//! - `POST /sync/2fa` with a pending session id and the user's code
//!
//! Each call carries a fresh bearer token from the [`WorkerAuthBridge`] and is
//! bounded by a timeout. Nothing is retried: a verification code must not be
//! submitted twice.

use crate::error::WorkerError;
use bridge_traits::error::BridgeError;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_auth::{Credentials, SessionArtifact, WorkerAuthBridge};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub type WorkerResult<T> = std::result::Result<T, WorkerError>;

const SYNC_PATH: &str = "/sync";
const TWO_FACTOR_PATH: &str = "/sync/2fa";

/// Terminal result of a worker pull.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkerSyncSummary {
    pub imported: u64,
    pub skipped: u64,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Renewed session to persist for the next pull
    #[serde(default)]
    pub session: Option<SessionArtifact>,
}

/// Body of a successful worker response, discriminated by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerResponse {
    Ok(WorkerSyncSummary),
    #[serde(rename = "needs_2fa")]
    NeedsTwoFactor { session_id: String },
}

#[derive(Serialize)]
struct SyncRequestBody<'a> {
    apple_id: &'a str,
    app_password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a SessionArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct TwoFactorRequestBody<'a> {
    session_id: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Clone)]
pub struct WorkerClient {
    http: Arc<dyn HttpClient>,
    auth: WorkerAuthBridge,
    timeout: Duration,
}

impl WorkerClient {
    pub fn new(http: Arc<dyn HttpClient>, auth: WorkerAuthBridge, timeout: Duration) -> Self {
        Self {
            http,
            auth,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        self.auth.base_url()
    }

    /// Ask the worker to pull the user's library.
    #[instrument(skip(self, credentials))]
    pub async fn start_sync(
        &self,
        user_id: &str,
        credentials: &Credentials,
        limit: Option<usize>,
    ) -> WorkerResult<WorkerResponse> {
        let body = SyncRequestBody {
            apple_id: &credentials.apple_id,
            app_password: &credentials.app_password,
            session: credentials.session.as_ref(),
            limit,
        };
        self.post(user_id, SYNC_PATH, &body).await
    }

    /// Submit a verification code for a pending worker session.
    #[instrument(skip(self, code))]
    pub async fn verify_two_factor(
        &self,
        user_id: &str,
        session_id: &str,
        code: &str,
    ) -> WorkerResult<WorkerResponse> {
        let body = TwoFactorRequestBody { session_id, code };
        self.post(user_id, TWO_FACTOR_PATH, &body).await
    }

    async fn post<B: Serialize + Sync>(
        &self,
        user_id: &str,
        path: &str,
        body: &B,
    ) -> WorkerResult<WorkerResponse> {
        let token = self.auth.issue_token(user_id)?;
        let request = HttpRequest::new(HttpMethod::Post, self.auth.endpoint(path))
            .bearer_token(token)
            .header("Accept", "application/json")
            .json(body)
            .map_err(|e| WorkerError::InvalidResponse(e.to_string()))?
            .timeout(self.timeout);

        let call = self.http.execute(request);
        let response = match tokio::time::timeout(self.timeout, call).await {
            Err(_) => {
                warn!(path, timeout_secs = self.timeout.as_secs(), "Worker call timed out");
                return Err(WorkerError::Timeout(self.timeout));
            }
            Ok(Err(BridgeError::Timeout(_))) => {
                warn!(path, "Worker call timed out in transport");
                return Err(WorkerError::Timeout(self.timeout));
            }
            Ok(Err(e)) => {
                warn!(path, error = %e, "Worker unreachable");
                return Err(WorkerError::Unreachable(e.to_string()));
            }
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            let message = error_message(&response);
            warn!(path, status = response.status, message = %message, "Worker returned an error");
            return Err(WorkerError::Application {
                status: response.status,
                message,
            });
        }

        let parsed: WorkerResponse = response
            .json()
            .map_err(|e| WorkerError::InvalidResponse(e.to_string()))?;

        match &parsed {
            WorkerResponse::Ok(summary) => info!(
                path,
                imported = summary.imported,
                skipped = summary.skipped,
                renewed_session = summary.session.is_some(),
                "Worker sync completed"
            ),
            WorkerResponse::NeedsTwoFactor { .. } => {
                debug!(path, "Worker requires two-factor verification")
            }
        }
        Ok(parsed)
    }
}

/// The worker's own error text: `detail` when the body has one, otherwise the
/// raw body, otherwise the status line.
fn error_message(response: &HttpResponse) -> String {
    if let Ok(ErrorBody { detail }) = response.json::<ErrorBody>() {
        return match detail {
            serde_json::Value::String(message) => message,
            other => other.to_string(),
        };
    }

    let text = response.text_lossy();
    let text = text.trim();
    if text.is_empty() {
        format!("Worker responded with status {}", response.status)
    } else {
        text.to_string()
    }
}
