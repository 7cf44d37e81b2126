//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for server and desktop hosts.
//!
//! - `HttpClient` using `reqwest`
//! - `ObjectStore` using `aws-sdk-s3`, usable against any S3-compatible endpoint
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, S3ObjectStore, S3StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let store = S3ObjectStore::connect(S3StoreConfig::new("auto")).await;
//!     // Hand both to the service layer
//!     Ok(())
//! }
//! ```

mod http;
mod object_store;

pub use http::ReqwestHttpClient;
pub use object_store::{S3ObjectStore, S3StoreConfig};
