//! Photo key classification

/// Lowercase extensions accepted for import.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic"];

/// Whether an object key names a photo this pipeline can import.
///
/// The extension of the last path segment is compared case-insensitively.
/// Dotfiles such as `photos/.jpg` have no extension.
pub fn is_supported_photo_key(key: &str) -> bool {
    let name = key.rsplit('/').next().unwrap_or(key);
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => {
            let extension = extension.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&extension.as_str())
        }
        _ => false,
    }
}
