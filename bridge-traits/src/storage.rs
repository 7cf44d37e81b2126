//! Object Storage Abstraction
//!
//! Capability trait over an S3-compatible bucket: paginated listing and whole
//! object reads. Any blob store exposing list (bucket, prefix, continuation
//! token) and get (bucket, key) satisfies it.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    /// Keys returned on this page, in the order the store produced them.
    pub keys: Vec<String>,
    /// Token to request the next page; `None` when the listing is exhausted.
    pub next_continuation_token: Option<String>,
}

impl ObjectPage {
    pub fn new(keys: Vec<String>, next_continuation_token: Option<String>) -> Self {
        Self {
            keys,
            next_continuation_token,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_continuation_token.is_none()
    }
}

/// Object store trait
///
/// Implementations must not retry internally; a failed call surfaces as an
/// error and the caller decides what to do with it.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::ObjectStore;
///
/// async fn first_page(store: &dyn ObjectStore) -> Result<Vec<String>> {
///     let page = store.list_objects("photos-bucket", "photos/", None).await?;
///     Ok(page.keys)
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of keys under `prefix`.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage>;

    /// Read the full contents of an object.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes>;
}
