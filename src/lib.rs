//! Workspace entry crate.
//!
//! Re-exports the `core-service` façade so host applications can depend on
//! `photomap-workspace` and enable the documented features without wiring each
//! crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
