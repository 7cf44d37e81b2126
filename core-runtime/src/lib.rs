//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the photo pipeline:
//! - Logging and tracing infrastructure
//! - Environment-driven configuration
//!
//! Every other crate depends on the conventions established here: settings are
//! read once into an [`AppConfig`](config::AppConfig) and each component asks it
//! for exactly the values it needs, failing with a configuration error that
//! names the missing variable.

pub mod config;
pub mod error;
pub mod logging;

pub use config::AppConfig;
pub use error::{Error, Result};
