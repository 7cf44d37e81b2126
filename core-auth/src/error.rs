use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("Encryption failed")]
    EncryptionFailed,

    /// Ciphertext is malformed, or does not authenticate under the active key.
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Token expired")]
    TokenExpired,

    #[error("Storage error: {0}")]
    Storage(#[from] LibraryError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
