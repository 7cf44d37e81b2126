use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error(transparent)]
    Configuration(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error(transparent)]
    Sync(#[from] core_sync::SyncError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] core_metadata::MetadataError),
}

impl CoreError {
    /// Whether the same call may succeed later without any change on the
    /// caller's side.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Sync(e) if e.is_retryable())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
