//! # Repository Pattern Implementation
//!
//! Repository traits and SQLite implementations for catalog data access.
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//!
//! ## Available Repositories
//!
//! - `SourceRepository` - Configured photo origins
//! - `PhotoRepository` - Cataloged photos with capture metadata
//! - `AccountRepository` - Encrypted iCloud credential records

pub mod account;
pub mod photo;
pub mod source;

pub use account::{AccountRepository, SqliteAccountRepository};
pub use photo::{PhotoRepository, SqlitePhotoRepository};
pub use source::{SourceRepository, SqliteSourceRepository};
