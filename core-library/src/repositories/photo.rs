//! Photo repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::Photo;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};
use std::collections::HashSet;
use tracing::debug;

/// Display order: newest capture first, unknown capture dates last, then
/// newest insert first. `id` makes ties deterministic.
const DISPLAY_ORDER: &str = "ORDER BY date_taken IS NULL, date_taken DESC, created_at DESC, id ASC";

/// Photo repository interface
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// Object keys already cataloged for a source.
    async fn existing_keys(&self, source_id: &str) -> Result<HashSet<String>>;

    /// Insert a new photo
    ///
    /// # Errors
    /// - `ConstraintViolation` if `(source_id, object_key)` or `id` already exists
    /// - `InvalidInput` if validation fails
    async fn insert(&self, photo: &Photo) -> Result<()>;

    /// All photos in display order.
    async fn list(&self) -> Result<Vec<Photo>>;
}

/// SQLite implementation of PhotoRepository
pub struct SqlitePhotoRepository {
    pool: SqlitePool,
}

impl SqlitePhotoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoRepository for SqlitePhotoRepository {
    async fn existing_keys(&self, source_id: &str) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT object_key FROM photos WHERE source_id = ?")
            .bind(source_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    async fn insert(&self, photo: &Photo) -> Result<()> {
        photo.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "photo".to_string(),
            message: msg,
        })?;

        let gps = photo.gps.as_ref();

        sqlx::query(
            r#"
            INSERT INTO photos (
                id, source_id, object_key, thumbnail_key, filename,
                has_gps, latitude, longitude, altitude,
                camera_make, camera_model, date_taken, width, height,
                created_at
            ) VALUES (
                ?, ?, ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?, ?, ?,
                ?
            )
            "#,
        )
        .bind(&photo.id)
        .bind(&photo.source_id)
        .bind(&photo.object_key)
        .bind(&photo.thumbnail_key)
        .bind(&photo.filename)
        .bind(photo.has_gps())
        .bind(gps.map(|g| g.latitude))
        .bind(gps.map(|g| g.longitude))
        .bind(gps.and_then(|g| g.altitude))
        .bind(&photo.camera_make)
        .bind(&photo.camera_model)
        .bind(&photo.date_taken)
        .bind(photo.width)
        .bind(photo.height)
        .bind(photo.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                LibraryError::ConstraintViolation {
                    entity_type: "photo".to_string(),
                    key: format!("{}/{}", photo.source_id, photo.object_key),
                }
            }
            other => LibraryError::Database(other),
        })?;

        debug!(photo_id = %photo.id, object_key = %photo.object_key, "Inserted photo");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Photo>> {
        let sql = format!("SELECT * FROM photos {}", DISPLAY_ORDER);
        let photos = query_as::<_, Photo>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(photos)
    }
}
