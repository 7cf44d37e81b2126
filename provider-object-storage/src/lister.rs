//! Bucket listing and object fetches over an [`ObjectStore`].

use bridge_traits::storage::ObjectStore;
use bytes::Bytes;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{ProviderError, Result};
use crate::keys::is_supported_photo_key;

/// Where the next listing request starts.
enum PageCursor {
    Start,
    Next(String),
    Done,
}

/// Lists and fetches objects in a bucket.
///
/// # Example
///
/// ```ignore
/// use futures::TryStreamExt;
/// use provider_object_storage::ObjectLister;
///
/// let lister = ObjectLister::new(store);
/// let keys: Vec<String> = lister.list_photo_keys("family-photos", "photos/").try_collect().await?;
/// ```
#[derive(Clone)]
pub struct ObjectLister {
    store: Arc<dyn ObjectStore>,
}

impl ObjectLister {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Every key under `prefix`, in the order the store returns them.
    ///
    /// Pages are requested only as the stream is polled, so a consumer that
    /// stops early never pays for the rest of the listing. The first failed
    /// page ends the stream with [`ProviderError::StorageUnavailable`].
    pub fn list(&self, bucket: &str, prefix: &str) -> BoxStream<'static, Result<String>> {
        let store = Arc::clone(&self.store);
        let bucket = bucket.to_string();
        let prefix = prefix.to_string();

        stream::try_unfold(PageCursor::Start, move |cursor| {
            let store = Arc::clone(&store);
            let bucket = bucket.clone();
            let prefix = prefix.clone();

            async move {
                let token = match cursor {
                    PageCursor::Done => return Ok(None),
                    PageCursor::Start => None,
                    PageCursor::Next(token) => Some(token),
                };

                let page = store
                    .list_objects(&bucket, &prefix, token.clone())
                    .await
                    .map_err(|e| {
                        warn!(bucket = %bucket, prefix = %prefix, error = %e, "Bucket listing failed");
                        ProviderError::unavailable(&bucket, e)
                    })?;

                debug!(
                    bucket = %bucket,
                    keys = page.keys.len(),
                    has_more = !page.is_last(),
                    "Listed bucket page"
                );

                let next = match page.next_continuation_token {
                    Some(next) if next.is_empty() => PageCursor::Done,
                    Some(next) if token.as_deref() == Some(next.as_str()) => {
                        warn!(bucket = %bucket, "Store repeated its continuation token; stopping listing");
                        PageCursor::Done
                    }
                    Some(next) => PageCursor::Next(next),
                    None => PageCursor::Done,
                };

                Ok::<_, ProviderError>(Some((page.keys, next)))
            }
        })
        .map_ok(|keys| stream::iter(keys.into_iter().map(Ok::<String, ProviderError>)))
        .try_flatten()
        .boxed()
    }

    /// [`list`](Self::list) restricted to supported photo keys.
    pub fn list_photo_keys(&self, bucket: &str, prefix: &str) -> BoxStream<'static, Result<String>> {
        self.list(bucket, prefix)
            .try_filter(|key| {
                let supported = is_supported_photo_key(key);
                if !supported {
                    debug!(key = %key, "Skipping unsupported object");
                }
                future::ready(supported)
            })
            .boxed()
    }

    /// Read a whole object.
    #[instrument(skip(self))]
    pub async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let bytes = self
            .store
            .get_object(bucket, key)
            .await
            .map_err(|e| ProviderError::from_fetch(bucket, key, e))?;

        debug!(size = bytes.len(), "Fetched object");
        Ok(bytes)
    }
}
