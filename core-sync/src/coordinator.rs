//! # Sync Orchestrator
//!
//! Imports new photos from a bucket into the catalog.
//!
//! ## Workflow
//!
//! 1. Ensure the catalog schema and register the photo source (both idempotent)
//! 2. Load the keys already cataloged for the source: the dedup frontier
//! 3. Stream supported photo keys from the bucket listing
//! 4. Stop after the processing budget: explicit `limit`, else the configured
//!    default, else no bound
//! 5. For each candidate, in listing order:
//!    - already in the frontier: count as skipped, never fetched
//!    - otherwise fetch, extract metadata, derive the thumbnail key, insert
//! 6. A failing object is recorded in `errors` and the loop moves on
//!
//! Candidates are handled one at a time. Two concurrent runs can both decide
//! a key is new; the catalog's unique index rejects the second insert, which
//! then shows up as an ordinary per-object error.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let orchestrator = SyncOrchestrator::new(config, catalog, lister, extractor, clock);
//! let result = orchestrator.sync(Some(100)).await?;
//! println!("imported {}, skipped {}", result.imported, result.skipped);
//! ```

use crate::{result::SyncResult, Result};
use bridge_traits::time::Clock;
use core_library::{Catalog, Photo, PhotoSource, SourceConfig};
use core_metadata::MetadataExtractor;
use futures::{StreamExt, TryStreamExt};
use provider_object_storage::ObjectLister;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Where to import from and how much per run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub bucket: String,
    /// Listing prefix for originals, e.g. `photos/`
    pub photo_prefix: String,
    /// Prefix that replaces `photo_prefix` to name a photo's thumbnail
    pub thumbnail_prefix: Option<String>,
    pub source_id: String,
    pub source_label: String,
    /// Budget used when a run does not pass its own limit
    pub default_limit: Option<usize>,
}

impl SyncConfig {
    pub fn new(bucket: impl Into<String>, photo_prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            photo_prefix: photo_prefix.into(),
            thumbnail_prefix: None,
            source_id: "default".to_string(),
            source_label: "Photo bucket".to_string(),
            default_limit: None,
        }
    }

    pub fn with_thumbnail_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thumbnail_prefix = Some(prefix.into());
        self
    }

    pub fn with_source(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.source_id = id.into();
        self.source_label = label.into();
        self
    }

    pub fn with_default_limit(mut self, limit: Option<usize>) -> Self {
        self.default_limit = limit;
        self
    }

    /// Thumbnail key for `key`, when a thumbnail prefix is configured.
    ///
    /// The photo prefix is swapped for the thumbnail prefix; a key outside the
    /// photo prefix keeps its full path under the thumbnail prefix.
    pub fn thumbnail_key_for(&self, key: &str) -> Option<String> {
        let thumbnail_prefix = self.thumbnail_prefix.as_deref()?;
        let relative = key.strip_prefix(self.photo_prefix.as_str()).unwrap_or(key);
        Some(format!("{}{}", thumbnail_prefix, relative))
    }

    fn source(&self, created_at: i64) -> PhotoSource {
        PhotoSource::new(
            self.source_id.clone(),
            self.source_label.clone(),
            SourceConfig::ObjectStorage {
                bucket: self.bucket.clone(),
                prefix: self.photo_prefix.clone(),
            },
            created_at,
        )
    }
}

pub struct SyncOrchestrator {
    config: SyncConfig,
    catalog: Catalog,
    lister: ObjectLister,
    extractor: Arc<dyn MetadataExtractor>,
    clock: Arc<dyn Clock>,
}

impl SyncOrchestrator {
    pub fn new(
        config: SyncConfig,
        catalog: Catalog,
        lister: ObjectLister,
        extractor: Arc<dyn MetadataExtractor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            catalog,
            lister,
            extractor,
            clock,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one sync pass.
    ///
    /// # Errors
    ///
    /// Schema setup, source registration, loading the frontier and listing
    /// the bucket abort the run. Failures for individual objects do not; they
    /// are reported in [`SyncResult::errors`].
    #[instrument(skip(self), fields(bucket = %self.config.bucket, source_id = %self.config.source_id))]
    pub async fn sync(&self, limit: Option<usize>) -> Result<SyncResult> {
        self.catalog.ensure_schema().await?;

        let source = self.config.source(self.clock.unix_timestamp());
        if self.catalog.register_source(&source).await? {
            info!(label = %source.label, "Registered photo source");
        }

        let mut frontier = self.catalog.existing_keys(&self.config.source_id).await?;
        debug!(known = frontier.len(), "Loaded dedup frontier");

        let budget = limit.or(self.config.default_limit);
        let candidates = self
            .lister
            .list_photo_keys(&self.config.bucket, &self.config.photo_prefix);
        let mut candidates = match budget {
            Some(budget) => candidates.take(budget).boxed(),
            None => candidates,
        };

        let mut result = SyncResult::default();

        while let Some(key) = candidates.try_next().await? {
            if frontier.contains(&key) {
                result.skipped += 1;
                continue;
            }

            match self.import(&key).await {
                Ok(photo) => {
                    debug!(key = %key, photo_id = %photo.id, has_gps = photo.has_gps(), "Imported photo");
                    frontier.insert(key);
                    result.imported += 1;
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Photo import failed");
                    result.record_failure(&key, &e);
                }
            }
        }

        info!(
            imported = result.imported,
            skipped = result.skipped,
            failed = result.failed(),
            budget = ?budget,
            "Sync finished"
        );
        Ok(result)
    }

    async fn import(&self, key: &str) -> Result<Photo> {
        let bytes = self.lister.fetch(&self.config.bucket, key).await?;
        let metadata = self.extractor.extract(&bytes)?;

        let photo = Photo {
            id: Uuid::new_v4().to_string(),
            source_id: self.config.source_id.clone(),
            object_key: key.to_string(),
            thumbnail_key: self.config.thumbnail_key_for(key),
            filename: Photo::filename_from_key(key).to_string(),
            gps: metadata.gps,
            camera_make: metadata.make,
            camera_model: metadata.model,
            date_taken: metadata.date_taken,
            width: metadata.width,
            height: metadata.height,
            created_at: self.clock.unix_timestamp(),
        };

        self.catalog.insert_photo(&photo).await?;
        Ok(photo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_key_swaps_prefix() {
        let config = SyncConfig::new("bucket", "photos/").with_thumbnail_prefix("thumbs/");

        assert_eq!(
            config.thumbnail_key_for("photos/2023/IMG_1.jpg").as_deref(),
            Some("thumbs/2023/IMG_1.jpg")
        );
        assert_eq!(
            config.thumbnail_key_for("elsewhere/IMG_2.jpg").as_deref(),
            Some("thumbs/elsewhere/IMG_2.jpg")
        );
    }

    #[test]
    fn test_no_thumbnail_prefix_means_no_thumbnail() {
        let config = SyncConfig::new("bucket", "photos/");
        assert_eq!(config.thumbnail_key_for("photos/IMG_1.jpg"), None);
    }

    #[test]
    fn test_source_captures_bucket_and_prefix() {
        let config = SyncConfig::new("family", "photos/").with_source("fam", "Family");
        let source = config.source(42);

        assert_eq!(source.id, "fam");
        assert_eq!(source.label, "Family");
        assert_eq!(
            source.config,
            SourceConfig::ObjectStorage {
                bucket: "family".to_string(),
                prefix: "photos/".to_string()
            }
        );
    }
}
