//! iCloud account repository
//!
//! Stores vault ciphertext only. Encryption and decryption happen in the
//! credential vault, which is the sole caller.

use crate::error::{LibraryError, Result};
use crate::models::IcloudAccount;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn exists(&self, user_id: &str) -> Result<bool>;

    async fn find(&self, user_id: &str) -> Result<Option<IcloudAccount>>;

    /// Create or overwrite the credential columns and clear any stored session.
    async fn upsert_credentials(
        &self,
        user_id: &str,
        apple_id_encrypted: &str,
        app_password_encrypted: &str,
        updated_at: i64,
    ) -> Result<()>;

    /// Replace the session columns, leaving credentials untouched.
    ///
    /// # Errors
    /// `NotFound` if the user has no account row.
    async fn update_session(
        &self,
        user_id: &str,
        session_file_name: &str,
        session_data_encrypted: &str,
        updated_at: i64,
    ) -> Result<()>;
}

pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn exists(&self, user_id: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM icloud_accounts WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 > 0)
    }

    async fn find(&self, user_id: &str) -> Result<Option<IcloudAccount>> {
        let account = query_as::<_, IcloudAccount>(
            r#"
            SELECT user_id, apple_id_encrypted, app_password_encrypted,
                   session_file_name, session_data_encrypted, updated_at
            FROM icloud_accounts WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn upsert_credentials(
        &self,
        user_id: &str,
        apple_id_encrypted: &str,
        app_password_encrypted: &str,
        updated_at: i64,
    ) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "user_id".to_string(),
                message: "User id cannot be empty".to_string(),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO icloud_accounts (
                user_id, apple_id_encrypted, app_password_encrypted,
                session_file_name, session_data_encrypted, updated_at
            ) VALUES (?, ?, ?, NULL, NULL, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                apple_id_encrypted = excluded.apple_id_encrypted,
                app_password_encrypted = excluded.app_password_encrypted,
                session_file_name = NULL,
                session_data_encrypted = NULL,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(apple_id_encrypted)
        .bind(app_password_encrypted)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_session(
        &self,
        user_id: &str,
        session_file_name: &str,
        session_data_encrypted: &str,
        updated_at: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE icloud_accounts
            SET session_file_name = ?, session_data_encrypted = ?, updated_at = ?
            WHERE user_id = ?
            "#,
        )
        .bind(session_file_name)
        .bind(session_data_encrypted)
        .bind(updated_at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "icloud_account".to_string(),
                id: user_id.to_string(),
            });
        }

        Ok(())
    }
}
