//! Catalog read model for the UI.

use core_library::Photo;
use serde::Serialize;

/// Proxy route that streams an object through the service.
pub const PROXY_FILE_ROUTE: &str = "/api/photos/file";

/// How object keys become URLs a browser can load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetUrls {
    /// Direct CDN links: `{base}/{key}` with each key segment percent-encoded
    Public { base_url: String },
    /// Links through the service: `/api/photos/file?key=<urlencoded key>`
    Proxy,
}

impl AssetUrls {
    pub fn from_public_base(base_url: Option<&str>) -> Self {
        match base_url.map(|b| b.trim_end_matches('/')).filter(|b| !b.is_empty()) {
            Some(base_url) => AssetUrls::Public {
                base_url: base_url.to_string(),
            },
            None => AssetUrls::Proxy,
        }
    }

    pub fn url_for(&self, key: &str) -> String {
        match self {
            AssetUrls::Public { base_url } => {
                let path: Vec<_> = key.split('/').map(urlencoding::encode).collect();
                format!("{}/{}", base_url, path.join("/"))
            }
            AssetUrls::Proxy => format!("{}?key={}", PROXY_FILE_ROUTE, urlencoding::encode(key)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoView {
    pub id: String,
    pub object_key: String,
    pub filename: String,
    pub original_url: String,
    /// Falls back to the original when no thumbnail key is known.
    pub thumbnail_url: String,
    pub has_gps: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub date_taken: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl PhotoView {
    pub fn from_photo(photo: Photo, urls: &AssetUrls) -> Self {
        let original_url = urls.url_for(&photo.object_key);
        let thumbnail_url = photo
            .thumbnail_key
            .as_deref()
            .map(|key| urls.url_for(key))
            .unwrap_or_else(|| original_url.clone());

        Self {
            has_gps: photo.has_gps(),
            latitude: photo.gps.map(|g| g.latitude),
            longitude: photo.gps.map(|g| g.longitude),
            altitude: photo.gps.and_then(|g| g.altitude),
            id: photo.id,
            object_key: photo.object_key,
            filename: photo.filename,
            original_url,
            thumbnail_url,
            camera_make: photo.camera_make,
            camera_model: photo.camera_model,
            date_taken: photo.date_taken,
            width: photo.width,
            height: photo.height,
        }
    }
}
