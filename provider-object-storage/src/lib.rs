//! # Object Storage Provider
//!
//! Enumerates photo objects in an S3-compatible bucket.
//!
//! ## Overview
//!
//! This module provides:
//! - A lazy key stream that follows continuation tokens until the listing is exhausted
//! - Filtering to supported photo extensions (`.jpg`, `.jpeg`, `.png`, `.heic`)
//! - Whole-object fetches for metadata extraction
//!
//! Transport and permission failures surface as [`ProviderError::StorageUnavailable`].
//! Nothing here retries.

pub mod error;
pub mod keys;
pub mod lister;

pub use error::{ProviderError, Result};
pub use keys::{is_supported_photo_key, SUPPORTED_EXTENSIONS};
pub use lister::ObjectLister;
