//! Catalog schema
//!
//! Every statement is `IF NOT EXISTS`, so [`ensure_schema`] is a handful of
//! no-ops once the tables exist and can run before every sync.

use crate::{LibraryError, Result};
use sqlx::SqlitePool;
use tracing::{debug, warn};

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS photo_sources (
        id TEXT PRIMARY KEY NOT NULL,
        kind TEXT NOT NULL,
        label TEXT NOT NULL,
        config TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS photos (
        id TEXT PRIMARY KEY NOT NULL,
        source_id TEXT NOT NULL REFERENCES photo_sources(id),
        object_key TEXT NOT NULL,
        thumbnail_key TEXT,
        filename TEXT NOT NULL,
        has_gps INTEGER NOT NULL DEFAULT 0,
        latitude REAL,
        longitude REAL,
        altitude REAL,
        camera_make TEXT,
        camera_model TEXT,
        date_taken TEXT,
        width INTEGER,
        height INTEGER,
        created_at INTEGER NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_photos_source_object_key ON photos(source_id, object_key)",
    "CREATE INDEX IF NOT EXISTS idx_photos_date_taken ON photos(date_taken)",
    r#"
    CREATE TABLE IF NOT EXISTS icloud_accounts (
        user_id TEXT PRIMARY KEY NOT NULL,
        apple_id_encrypted TEXT NOT NULL,
        app_password_encrypted TEXT NOT NULL,
        session_file_name TEXT,
        session_data_encrypted TEXT,
        updated_at INTEGER NOT NULL
    )
    "#,
];

/// Create the catalog tables and indexes when absent.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(*statement).execute(pool).await.map_err(|e| {
            warn!(error = %e, "Schema statement failed");
            LibraryError::Schema(e.to_string())
        })?;
    }

    debug!("Catalog schema ensured");
    Ok(())
}
