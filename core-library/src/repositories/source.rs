//! Photo source repository

use crate::error::{LibraryError, Result};
use crate::models::PhotoSource;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};
use tracing::debug;

#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Insert the source unless one with the same id exists.
    ///
    /// An existing source is left untouched, including its config.
    /// Returns `true` when a new row was written.
    async fn register(&self, source: &PhotoSource) -> Result<bool>;

    async fn find_by_id(&self, id: &str) -> Result<Option<PhotoSource>>;

    async fn list(&self) -> Result<Vec<PhotoSource>>;
}

pub struct SqliteSourceRepository {
    pool: SqlitePool,
}

impl SqliteSourceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceRepository for SqliteSourceRepository {
    async fn register(&self, source: &PhotoSource) -> Result<bool> {
        source.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "source".to_string(),
            message: msg,
        })?;

        let config = serde_json::to_string(&source.config).map_err(|e| LibraryError::InvalidInput {
            field: "config".to_string(),
            message: e.to_string(),
        })?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO photo_sources (id, kind, label, config, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&source.id)
        .bind(source.kind().as_str())
        .bind(&source.label)
        .bind(config)
        .bind(source.created_at)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        debug!(source_id = %source.id, inserted, "Registered photo source");
        Ok(inserted)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PhotoSource>> {
        let source = query_as::<_, PhotoSource>("SELECT * FROM photo_sources WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(source)
    }

    async fn list(&self) -> Result<Vec<PhotoSource>> {
        let sources = query_as::<_, PhotoSource>("SELECT * FROM photo_sources ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(sources)
    }
}
