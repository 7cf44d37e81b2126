//! # Application Configuration
//!
//! Environment-style settings for the photo pipeline.
//!
//! ## Overview
//!
//! [`AppConfig`] is read once from an environment lookup. Values that only some
//! operations need (bucket name, encryption key, worker URL and secret) are kept
//! optional and validated on access through the `require_*` accessors, so a
//! missing vault key does not stop bucket syncs from running and vice versa.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::from_env()?;
//! let bucket = config.storage.require_bucket()?;
//! ```
//!
//! Tests build configuration from a map instead of the process environment:
//!
//! ```ignore
//! let vars = HashMap::from([("PHOTO_BUCKET", "photos")]);
//! let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()))?;
//! ```

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://photomap.db";
pub const DEFAULT_REGION: &str = "auto";
pub const DEFAULT_PHOTO_PREFIX: &str = "photos/";
pub const DEFAULT_SOURCE_ID: &str = "default";
pub const DEFAULT_SOURCE_LABEL: &str = "Photo bucket";
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(60);

/// Length in bytes of the vault key.
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// Bucket connection and key layout.
#[derive(Clone)]
pub struct StorageSettings {
    pub bucket: Option<String>,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
    /// Always ends with `/`.
    pub photo_prefix: String,
    /// Always ends with `/` when present.
    pub thumbnail_prefix: Option<String>,
    /// CDN base for direct asset URLs, without trailing slash.
    pub public_base_url: Option<String>,
}

impl StorageSettings {
    pub fn require_bucket(&self) -> Result<&str> {
        self.bucket
            .as_deref()
            .ok_or_else(|| Error::missing("PHOTO_BUCKET", "bucket name is required to sync photos"))
    }
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "[REDACTED]"))
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "[REDACTED]"))
            .field("force_path_style", &self.force_path_style)
            .field("photo_prefix", &self.photo_prefix)
            .field("thumbnail_prefix", &self.thumbnail_prefix)
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

/// Identity of the configured photo source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub id: String,
    pub label: String,
}

/// Remote iCloud worker location and shared secret.
#[derive(Clone)]
pub struct WorkerSettings {
    pub base_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub timeout: Duration,
}

impl WorkerSettings {
    pub fn require_base_url(&self) -> Result<&str> {
        self.base_url
            .as_deref()
            .ok_or_else(|| Error::missing("ICLOUD_WORKER_URL", "worker URL is required for iCloud sync"))
    }

    pub fn require_jwt_secret(&self) -> Result<&str> {
        self.jwt_secret
            .as_deref()
            .ok_or_else(|| Error::missing("WORKER_JWT_SECRET", "shared secret is required for iCloud sync"))
    }
}

impl fmt::Debug for WorkerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerSettings")
            .field("base_url", &self.base_url)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Complete process configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub storage: StorageSettings,
    pub source: SourceSettings,
    pub worker: WorkerSettings,
    /// Default processing budget for a sync when the caller gives none.
    pub sync_limit: Option<usize>,
    encryption_key: Option<String>,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout = match get("WORKER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    Error::Config(format!("WORKER_TIMEOUT_SECS must be a whole number of seconds, got {:?}", raw))
                })?;
                if secs == 0 {
                    return Err(Error::Config("WORKER_TIMEOUT_SECS must be positive".to_string()));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_WORKER_TIMEOUT,
        };

        let storage = StorageSettings {
            bucket: get("PHOTO_BUCKET"),
            region: get("S3_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint: get("S3_ENDPOINT"),
            access_key_id: get("S3_ACCESS_KEY_ID"),
            secret_access_key: get("S3_SECRET_ACCESS_KEY"),
            force_path_style: get("S3_FORCE_PATH_STYLE").as_deref() == Some("true"),
            photo_prefix: normalize_prefix(
                &get("PHOTO_PREFIX").unwrap_or_else(|| DEFAULT_PHOTO_PREFIX.to_string()),
            ),
            thumbnail_prefix: get("THUMBNAIL_PREFIX").map(|p| normalize_prefix(&p)),
            public_base_url: get("PUBLIC_PHOTO_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            storage,
            source: SourceSettings {
                id: get("PHOTO_SOURCE_ID").unwrap_or_else(|| DEFAULT_SOURCE_ID.to_string()),
                label: get("PHOTO_SOURCE_LABEL").unwrap_or_else(|| DEFAULT_SOURCE_LABEL.to_string()),
            },
            worker: WorkerSettings {
                base_url: get("ICLOUD_WORKER_URL"),
                jwt_secret: get("WORKER_JWT_SECRET"),
                timeout,
            },
            sync_limit: get("SYNC_LIMIT").and_then(|raw| parse_limit(&raw)),
            encryption_key: get("ICLOUD_ENCRYPTION_KEY"),
        })
    }

    /// Decode the vault key.
    ///
    /// Accepts 64 hex characters or standard base64, and requires exactly
    /// [`ENCRYPTION_KEY_LEN`] bytes either way.
    pub fn require_encryption_key(&self) -> Result<Vec<u8>> {
        let raw = self.encryption_key.as_deref().ok_or_else(|| {
            Error::missing("ICLOUD_ENCRYPTION_KEY", "a 32-byte key is required for the credential vault")
        })?;
        decode_key(raw)
    }

    pub fn has_encryption_key(&self) -> bool {
        self.encryption_key.is_some()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("storage", &self.storage)
            .field("source", &self.source)
            .field("worker", &self.worker)
            .field("sync_limit", &self.sync_limit)
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Append a trailing `/` when missing.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

/// `SYNC_LIMIT` parsing: positive integers bound the batch, anything else
/// means no bound.
fn parse_limit(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok().filter(|limit| *limit > 0)
}

fn decode_key(raw: &str) -> Result<Vec<u8>> {
    let bytes = if raw.len() == ENCRYPTION_KEY_LEN * 2 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
        hex::decode(raw).map_err(|e| Error::Config(format!("ICLOUD_ENCRYPTION_KEY is not valid hex: {}", e)))?
    } else {
        STANDARD
            .decode(raw)
            .map_err(|e| Error::Config(format!("ICLOUD_ENCRYPTION_KEY is not valid base64: {}", e)))?
    };

    if bytes.len() != ENCRYPTION_KEY_LEN {
        return Err(Error::Config(format!(
            "ICLOUD_ENCRYPTION_KEY must decode to {} bytes, got {}",
            ENCRYPTION_KEY_LEN,
            bytes.len()
        )));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.storage.region, "auto");
        assert_eq!(config.storage.photo_prefix, "photos/");
        assert!(config.storage.thumbnail_prefix.is_none());
        assert!(!config.storage.force_path_style);
        assert_eq!(config.source.id, "default");
        assert_eq!(config.worker.timeout, DEFAULT_WORKER_TIMEOUT);
        assert_eq!(config.sync_limit, None);
    }

    #[test]
    fn test_missing_bucket_names_the_variable() {
        let config = config_from(&[]).unwrap();
        let err = config.storage.require_bucket().unwrap_err();

        assert!(matches!(err, Error::MissingSetting { ref setting, .. } if setting == "PHOTO_BUCKET"));
    }

    #[test]
    fn test_prefixes_get_trailing_slash() {
        let config = config_from(&[("PHOTO_PREFIX", "uploads"), ("THUMBNAIL_PREFIX", "thumbs")]).unwrap();

        assert_eq!(config.storage.photo_prefix, "uploads/");
        assert_eq!(config.storage.thumbnail_prefix.as_deref(), Some("thumbs/"));
    }

    #[test]
    fn test_force_path_style_requires_literal_true() {
        let on = config_from(&[("S3_FORCE_PATH_STYLE", "true")]).unwrap();
        let off = config_from(&[("S3_FORCE_PATH_STYLE", "1")]).unwrap();

        assert!(on.storage.force_path_style);
        assert!(!off.storage.force_path_style);
    }

    #[test]
    fn test_sync_limit_parsing() {
        assert_eq!(config_from(&[("SYNC_LIMIT", "25")]).unwrap().sync_limit, Some(25));
        assert_eq!(config_from(&[("SYNC_LIMIT", "0")]).unwrap().sync_limit, None);
        assert_eq!(config_from(&[("SYNC_LIMIT", "lots")]).unwrap().sync_limit, None);
    }

    #[test]
    fn test_public_base_url_trailing_slash_removed() {
        let config = config_from(&[("PUBLIC_PHOTO_BASE_URL", "https://cdn.example.com/")]).unwrap();
        assert_eq!(config.storage.public_base_url.as_deref(), Some("https://cdn.example.com"));
    }

    #[test]
    fn test_encryption_key_hex_and_base64() {
        let hex_key = "00".repeat(32);
        let config = config_from(&[("ICLOUD_ENCRYPTION_KEY", hex_key.as_str())]).unwrap();
        assert_eq!(config.require_encryption_key().unwrap(), vec![0u8; 32]);

        let b64_key = STANDARD.encode([7u8; 32]);
        let config = config_from(&[("ICLOUD_ENCRYPTION_KEY", b64_key.as_str())]).unwrap();
        assert_eq!(config.require_encryption_key().unwrap(), vec![7u8; 32]);
    }

    #[test]
    fn test_encryption_key_wrong_length() {
        let short = STANDARD.encode([1u8; 16]);
        let config = config_from(&[("ICLOUD_ENCRYPTION_KEY", short.as_str())]).unwrap();

        assert!(matches!(config.require_encryption_key(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_encryption_key() {
        let config = config_from(&[]).unwrap();
        assert!(!config.has_encryption_key());
        assert!(matches!(
            config.require_encryption_key(),
            Err(Error::MissingSetting { .. })
        ));
    }

    #[test]
    fn test_invalid_worker_timeout() {
        assert!(config_from(&[("WORKER_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config_from(&[("WORKER_TIMEOUT_SECS", "0")]).is_err());
        let config = config_from(&[("WORKER_TIMEOUT_SECS", "15")]).unwrap();
        assert_eq!(config.worker.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let key = "ab".repeat(32);
        let config = config_from(&[
            ("WORKER_JWT_SECRET", "jwt-shared-secret"),
            ("S3_SECRET_ACCESS_KEY", "s3-secret"),
            ("ICLOUD_ENCRYPTION_KEY", key.as_str()),
        ])
        .unwrap();
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("jwt-shared-secret"));
        assert!(!rendered.contains("s3-secret"));
        assert!(!rendered.contains(&key));
    }
}
