//! # Photo Metadata Module
//!
//! Reads capture metadata out of raw image bytes.
//!
//! ## Overview
//!
//! - GPS position (latitude, longitude, altitude) from the EXIF GPS IFD
//! - Camera make and model
//! - Capture date as an ISO-8601 string
//! - Pixel dimensions, from EXIF or the image header
//!
//! Every field is optional. A photo without EXIF yields empty metadata rather
//! than an error, so a single odd file never stops an import.

pub mod error;
pub mod extractor;

pub use error::{MetadataError, Result};
pub use extractor::{ExifMetadataExtractor, MetadataExtractor, PhotoMetadata};
