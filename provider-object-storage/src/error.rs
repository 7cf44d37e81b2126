//! Error types for the object storage provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Object storage provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The bucket could not be reached, or refused the request
    #[error("Storage unavailable ({bucket}): {message}")]
    StorageUnavailable { bucket: String, message: String },

    /// The key vanished between listing and fetching
    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },
}

/// Result type for object storage operations
pub type Result<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    pub(crate) fn unavailable(bucket: &str, error: BridgeError) -> Self {
        ProviderError::StorageUnavailable {
            bucket: bucket.to_string(),
            message: error.to_string(),
        }
    }

    pub(crate) fn from_fetch(bucket: &str, key: &str, error: BridgeError) -> Self {
        match error {
            BridgeError::NotFound(_) => ProviderError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            other => Self::unavailable(bucket, other),
        }
    }
}
