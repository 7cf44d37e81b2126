//! # Photo Catalog Module
//!
//! Owns the relational catalog: photo sources, photos and encrypted iCloud
//! account records.
//!
//! ## Overview
//!
//! - SQLite schema, applied idempotently by [`schema::ensure_schema`]
//! - Repository traits with SQLite implementations
//! - Deduplication on `(source_id, object_key)`, enforced by a unique index
//! - Display ordering by capture date, unknown dates last
//!
//! [`Catalog`] bundles the repositories for the sync pipeline and read API.

pub mod catalog;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod schema;

pub use catalog::Catalog;
pub use error::{LibraryError, Result};
pub use models::{GpsCoordinates, IcloudAccount, Photo, PhotoSource, SourceConfig, SourceKind};
