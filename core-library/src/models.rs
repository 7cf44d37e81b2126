//! Domain models for the photo catalog
//!
//! Row types for photo sources, photos and the encrypted iCloud account record.
//! Timestamps are Unix seconds.

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Photo sources
// =============================================================================

/// Kind of ingestion origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    ObjectStorage,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::ObjectStorage => "object_storage",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "object_storage" => Ok(SourceKind::ObjectStorage),
            other => Err(format!("unknown source kind: {}", other)),
        }
    }
}

/// Settings captured when a source is first registered, keyed by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    ObjectStorage { bucket: String, prefix: String },
}

impl SourceConfig {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceConfig::ObjectStorage { .. } => SourceKind::ObjectStorage,
        }
    }
}

/// One configured ingestion origin. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSource {
    pub id: String,
    pub label: String,
    pub config: SourceConfig,
    pub created_at: i64,
}

impl PhotoSource {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        config: SourceConfig,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            config,
            created_at,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.config.kind()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Source id cannot be empty".to_string());
        }
        match &self.config {
            SourceConfig::ObjectStorage { bucket, .. } if bucket.trim().is_empty() => {
                Err("Object storage source requires a bucket".to_string())
            }
            _ => Ok(()),
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for PhotoSource {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let raw_config: String = row.try_get("config")?;
        let config: SourceConfig =
            serde_json::from_str(&raw_config).map_err(|e| sqlx::Error::ColumnDecode {
                index: "config".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            label: row.try_get("label")?,
            config,
            created_at: row.try_get("created_at")?,
        })
    }
}

// =============================================================================
// Photos
// =============================================================================

/// Capture location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

impl GpsCoordinates {
    /// Coordinates exist only when latitude and longitude are both present and
    /// finite. A non-finite altitude is dropped.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
        altitude: Option<f64>,
    ) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Some(Self {
                    latitude,
                    longitude,
                    altitude: altitude.filter(|a| a.is_finite()),
                })
            }
            _ => None,
        }
    }
}

/// One catalog entry per distinct object in a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub source_id: String,
    pub object_key: String,
    pub thumbnail_key: Option<String>,
    pub filename: String,
    pub gps: Option<GpsCoordinates>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    /// ISO-8601
    pub date_taken: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub created_at: i64,
}

impl Photo {
    pub fn has_gps(&self) -> bool {
        self.gps.is_some()
    }

    /// Last path segment of an object key.
    pub fn filename_from_key(key: &str) -> &str {
        key.rsplit('/').next().unwrap_or(key)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Photo id cannot be empty".to_string());
        }
        if self.object_key.trim().is_empty() {
            return Err("Photo object key cannot be empty".to_string());
        }
        if self.filename.trim().is_empty() {
            return Err("Photo filename cannot be empty".to_string());
        }
        Ok(())
    }
}

impl<'r> FromRow<'r, SqliteRow> for Photo {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        let gps = GpsCoordinates::from_parts(
            row.try_get("latitude")?,
            row.try_get("longitude")?,
            row.try_get("altitude")?,
        );

        Ok(Self {
            id: row.try_get("id")?,
            source_id: row.try_get("source_id")?,
            object_key: row.try_get("object_key")?,
            thumbnail_key: row.try_get("thumbnail_key")?,
            filename: row.try_get("filename")?,
            gps,
            camera_make: row.try_get("camera_make")?,
            camera_model: row.try_get("camera_model")?,
            date_taken: row.try_get("date_taken")?,
            width: row.try_get("width")?,
            height: row.try_get("height")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

// =============================================================================
// iCloud accounts
// =============================================================================

/// Per-user credential record. Every secret column holds vault ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct IcloudAccount {
    pub user_id: String,
    pub apple_id_encrypted: String,
    pub app_password_encrypted: String,
    pub session_file_name: Option<String>,
    pub session_data_encrypted: Option<String>,
    pub updated_at: i64,
}

impl IcloudAccount {
    pub fn has_session(&self) -> bool {
        self.session_file_name.is_some() && self.session_data_encrypted.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gps_requires_latitude_and_longitude() {
        assert!(GpsCoordinates::from_parts(Some(48.85), Some(2.35), None).is_some());
        assert!(GpsCoordinates::from_parts(None, None, Some(120.0)).is_none());
        assert!(GpsCoordinates::from_parts(Some(48.85), None, Some(120.0)).is_none());
        assert!(GpsCoordinates::from_parts(Some(f64::NAN), Some(2.35), None).is_none());
        assert!(GpsCoordinates::from_parts(Some(48.85), Some(f64::INFINITY), None).is_none());
    }

    #[test]
    fn test_gps_drops_non_finite_altitude() {
        let gps = GpsCoordinates::from_parts(Some(1.0), Some(2.0), Some(f64::NAN)).unwrap();
        assert_eq!(gps.altitude, None);
    }

    #[test]
    fn test_source_config_is_tagged_by_kind() {
        let config = SourceConfig::ObjectStorage {
            bucket: "family-photos".to_string(),
            prefix: "photos/".to_string(),
        };
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["kind"], "object_storage");
        assert_eq!(json["bucket"], "family-photos");
        assert_eq!(config.kind(), SourceKind::ObjectStorage);
        assert_eq!("object_storage".parse::<SourceKind>().unwrap(), SourceKind::ObjectStorage);
    }

    #[test]
    fn test_source_validation() {
        let source = PhotoSource::new(
            "default",
            "Bucket",
            SourceConfig::ObjectStorage {
                bucket: " ".to_string(),
                prefix: "photos/".to_string(),
            },
            0,
        );
        assert!(source.validate().is_err());
    }

    #[test]
    fn test_filename_from_key() {
        assert_eq!(Photo::filename_from_key("photos/2023/IMG_1.JPG"), "IMG_1.JPG");
        assert_eq!(Photo::filename_from_key("IMG_2.png"), "IMG_2.png");
    }
}
