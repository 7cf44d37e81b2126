use core_auth::AuthError;
use core_library::LibraryError;
use core_metadata::MetadataError;
use provider_object_storage::ProviderError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Catalog(#[from] LibraryError),

    #[error(transparent)]
    Storage(#[from] ProviderError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("No iCloud credentials saved for user {user_id}")]
    NoCredentials { user_id: String },

    /// A two-factor challenge issued by this process outlived its window.
    #[error("Two-factor challenge {session_id} has expired")]
    ChallengeExpired { session_id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Failures talking to the iCloud worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Worker unreachable: {0}")]
    Unreachable(String),

    /// The worker answered with an error; `message` is its own wording.
    #[error("{message}")]
    Application { status: u16, message: String },

    #[error("Invalid worker response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Token(#[from] AuthError),
}

impl WorkerError {
    /// Transport-level failures that may succeed if the caller tries again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkerError::Timeout(_) | WorkerError::Unreachable(_))
    }
}

impl SyncError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Worker(e) if e.is_retryable())
    }
}
