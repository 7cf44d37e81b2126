//! Catalog store façade
//!
//! Bundles the pool with the source, photo and account repositories and exposes
//! the operations the sync pipeline and the read API need.

use crate::error::Result;
use crate::models::{Photo, PhotoSource};
use crate::repositories::{
    AccountRepository, PhotoRepository, SourceRepository,
    SqliteAccountRepository, SqlitePhotoRepository, SqliteSourceRepository,
};
use crate::schema;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct Catalog {
    pool: SqlitePool,
    sources: Arc<dyn SourceRepository>,
    photos: Arc<dyn PhotoRepository>,
    accounts: Arc<dyn AccountRepository>,
}

impl Catalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            sources: Arc::new(SqliteSourceRepository::new(pool.clone())),
            photos: Arc::new(SqlitePhotoRepository::new(pool.clone())),
            accounts: Arc::new(SqliteAccountRepository::new(pool.clone())),
            pool,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn sources(&self) -> Arc<dyn SourceRepository> {
        Arc::clone(&self.sources)
    }

    pub fn photos(&self) -> Arc<dyn PhotoRepository> {
        Arc::clone(&self.photos)
    }

    pub fn accounts(&self) -> Arc<dyn AccountRepository> {
        Arc::clone(&self.accounts)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.pool).await
    }

    pub async fn register_source(&self, source: &PhotoSource) -> Result<bool> {
        self.sources.register(source).await
    }

    /// The dedup frontier for a source.
    pub async fn existing_keys(&self, source_id: &str) -> Result<HashSet<String>> {
        self.photos.existing_keys(source_id).await
    }

    pub async fn insert_photo(&self, photo: &Photo) -> Result<()> {
        self.photos.insert(photo).await
    }

    pub async fn list_photos(&self) -> Result<Vec<Photo>> {
        self.photos.list().await
    }
}
