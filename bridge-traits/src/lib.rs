//! # Host Bridge Traits
//!
//! Capability traits the photo pipeline requires from its host.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations used for the worker calls
//! - [`ObjectStore`](storage::ObjectStore) - Paginated bucket listing and object reads
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! Desktop adapters live in `bridge-desktop`. Tests substitute fakes or
//! `mockall` mocks for each trait.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Adapters convert
//! their native errors and keep timeouts and connection failures distinguishable
//! from ordinary operation failures.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::{ObjectPage, ObjectStore};
pub use time::{Clock, FixedClock, LogLevel, SystemClock};
