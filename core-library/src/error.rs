use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// A row with the same unique key already exists. Nothing was written.
    #[error("Constraint violation on {entity_type}: {key} already exists")]
    ConstraintViolation { entity_type: String, key: String },

    #[error("Schema setup failed: {0}")]
    Schema(String),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
