//! # EXIF Metadata Extraction
//!
//! Turns the raw bytes of a photo into [`PhotoMetadata`].
//!
//! ## Overview
//!
//! Tags are read with `kamadak-exif` from whatever container it recognizes
//! (JPEG, PNG, HEIF, TIFF, WebP). GPS is decoded on its own path: a missing or
//! malformed GPS IFD only clears `gps`, every other field is still returned.
//!
//! Numeric tags that are absent, zero or of a non-integer type come back as
//! `None`. When EXIF carries no pixel dimensions the image header is probed
//! instead.
//!
//! ```ignore
//! let extractor = ExifMetadataExtractor::new();
//! let metadata = extractor.extract(&bytes)?;
//! if let Some(gps) = metadata.gps {
//!     println!("{}, {}", gps.latitude, gps.longitude);
//! }
//! ```

use crate::error::{MetadataError, Result};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use core_library::GpsCoordinates;
use exif::{Exif, In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::{debug, warn};

/// Capture metadata for a single photo. Every field may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub gps: Option<GpsCoordinates>,
    pub make: Option<String>,
    pub model: Option<String>,
    /// ISO-8601, with an offset when the camera recorded one
    pub date_taken: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl PhotoMetadata {
    pub fn has_gps(&self) -> bool {
        self.gps.is_some()
    }
}

/// Parses image bytes into [`PhotoMetadata`].
pub trait MetadataExtractor: Send + Sync {
    /// # Errors
    ///
    /// Fails only when the bytes cannot be read as an image at all. Missing
    /// EXIF, or a broken GPS block, yields partial metadata instead.
    fn extract(&self, bytes: &[u8]) -> Result<PhotoMetadata>;
}

/// [`MetadataExtractor`] backed by `kamadak-exif`.
#[derive(Debug, Clone)]
pub struct ExifMetadataExtractor {
    probe_dimensions: bool,
}

impl ExifMetadataExtractor {
    pub fn new() -> Self {
        Self {
            probe_dimensions: true,
        }
    }

    /// Skip decoding the image header when EXIF has no dimensions.
    pub fn without_dimension_probe() -> Self {
        Self {
            probe_dimensions: false,
        }
    }

    fn read_exif(bytes: &[u8]) -> Result<Option<Exif>> {
        let parsed = Reader::new()
            .continue_on_error(true)
            .read_from_container(&mut Cursor::new(bytes));

        match parsed {
            Ok(exif) => Ok(Some(exif)),
            Err(exif::Error::PartialResult(partial)) => {
                let (exif, ignored) = partial.into_inner();
                warn!(
                    fields = exif.fields().len(),
                    errors = ?ignored,
                    "Malformed EXIF entries skipped"
                );
                Ok(Some(exif))
            }
            Err(exif::Error::NotFound(container)) => {
                debug!(container, "No EXIF data present");
                Ok(None)
            }
            Err(e) => Err(MetadataError::ExtractionFailed(e.to_string())),
        }
    }

    fn dimensions(&self, exif: Option<&Exif>, bytes: &[u8]) -> (Option<u32>, Option<u32>) {
        let from_exif = exif.map(|exif| {
            (
                positive_uint(exif, Tag::PixelXDimension)
                    .or_else(|| positive_uint(exif, Tag::ImageWidth)),
                positive_uint(exif, Tag::PixelYDimension)
                    .or_else(|| positive_uint(exif, Tag::ImageLength)),
            )
        });

        match from_exif {
            Some((Some(width), Some(height))) => (Some(width), Some(height)),
            partial if self.probe_dimensions => match probe_dimensions(bytes) {
                Some((width, height)) => (Some(width), Some(height)),
                None => partial.unwrap_or((None, None)),
            },
            partial => partial.unwrap_or((None, None)),
        }
    }
}

impl Default for ExifMetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor for ExifMetadataExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<PhotoMetadata> {
        if bytes.is_empty() {
            return Err(MetadataError::UnsupportedFormat("empty object".to_string()));
        }

        let exif = Self::read_exif(bytes)?;
        let (width, height) = self.dimensions(exif.as_ref(), bytes);

        let Some(exif) = exif else {
            return Ok(PhotoMetadata {
                width,
                height,
                ..PhotoMetadata::default()
            });
        };

        Ok(PhotoMetadata {
            gps: extract_gps(&exif),
            make: ascii_field(&exif, Tag::Make),
            model: ascii_field(&exif, Tag::Model),
            date_taken: extract_date_taken(&exif),
            width,
            height,
        })
    }
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(values) => values
            .iter()
            .map(|raw| {
                String::from_utf8_lossy(raw)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string()
            })
            .find(|s| !s.is_empty()),
        _ => None,
    }
}

fn positive_uint(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .filter(|value| *value > 0)
}

fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    match reader.into_dimensions() {
        Ok((width, height)) if width > 0 && height > 0 => Some((width, height)),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "Could not read dimensions from image header");
            None
        }
    }
}

fn extract_date_taken(exif: &Exif) -> Option<String> {
    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))?;

    let raw = match &field.value {
        Value::Ascii(values) => values.first()?,
        _ => return None,
    };

    let mut datetime = match exif::DateTime::from_ascii(raw) {
        Ok(datetime) => datetime,
        Err(e) => {
            debug!(error = %e, "Unparseable capture date");
            return None;
        }
    };

    if let Some(Value::Ascii(offsets)) = exif
        .get_field(Tag::OffsetTimeOriginal, In::PRIMARY)
        .map(|f| &f.value)
    {
        if let Some(offset) = offsets.first() {
            // An unreadable offset leaves the local time intact.
            let _ = datetime.parse_offset(offset);
        }
    }

    let naive: NaiveDateTime = NaiveDate::from_ymd_opt(
        i32::from(datetime.year),
        u32::from(datetime.month),
        u32::from(datetime.day),
    )?
    .and_hms_opt(
        u32::from(datetime.hour),
        u32::from(datetime.minute),
        u32::from(datetime.second),
    )?;

    match datetime
        .offset
        .and_then(|minutes| FixedOffset::east_opt(i32::from(minutes) * 60))
    {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()),
        None => Some(naive.format("%Y-%m-%dT%H:%M:%S").to_string()),
    }
}

/// Decode the GPS IFD. Any missing or malformed piece means no position.
fn extract_gps(exif: &Exif) -> Option<GpsCoordinates> {
    let latitude = signed_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S');
    let longitude = signed_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W');

    let gps = GpsCoordinates::from_parts(latitude, longitude, altitude(exif));
    if gps.is_none() && (latitude.is_some() || longitude.is_some()) {
        debug!(?latitude, ?longitude, "Incomplete GPS position ignored");
    }
    gps
}

fn signed_coordinate(exif: &Exif, tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let degrees = match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(parts) if parts.len() >= 3 => {
            parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0
        }
        _ => return None,
    };

    let negative = match exif.get_field(ref_tag, In::PRIMARY).map(|f| &f.value) {
        Some(Value::Ascii(values)) => values
            .first()
            .and_then(|v| v.first())
            .is_some_and(|c| c.eq_ignore_ascii_case(&negative_ref)),
        _ => false,
    };

    Some(if negative { -degrees } else { degrees })
}

fn altitude(exif: &Exif) -> Option<f64> {
    let meters = match &exif.get_field(Tag::GPSAltitude, In::PRIMARY)?.value {
        Value::Rational(parts) => parts.first()?.to_f64(),
        _ => return None,
    };

    // Ref 1 means below sea level.
    let below = exif
        .get_field(Tag::GPSAltitudeRef, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        == Some(1);

    Some(if below { -meters } else { meters })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::{Field, Rational};

    fn field(tag: Tag, value: Value) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value,
        }
    }

    fn ascii(s: &str) -> Value {
        Value::Ascii(vec![s.as_bytes().to_vec()])
    }

    fn dms(degrees: u32, minutes: u32, centiseconds: u32) -> Value {
        Value::Rational(vec![
            Rational { num: degrees, denom: 1 },
            Rational { num: minutes, denom: 1 },
            Rational { num: centiseconds, denom: 100 },
        ])
    }

    /// Big-endian TIFF block holding `fields`.
    fn tiff_with(fields: &[Field]) -> Vec<u8> {
        let mut writer = Writer::new();
        for f in fields {
            writer.push_field(f);
        }
        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, false).unwrap();
        tiff.into_inner()
    }

    /// Point the IFD0 GPSInfo entry at `offset`.
    fn redirect_gps_pointer(tiff: &mut [u8], offset: u32) {
        let be16 = |at: usize| u16::from_be_bytes([tiff[at], tiff[at + 1]]);
        let ifd0 = u32::from_be_bytes(tiff[4..8].try_into().unwrap()) as usize;
        let count = be16(ifd0) as usize;
        let entry = (0..count)
            .map(|i| ifd0 + 2 + i * 12)
            .find(|&at| be16(at) == 0x8825)
            .expect("GPSInfo pointer in IFD0");
        tiff[entry + 8..entry + 12].copy_from_slice(&offset.to_be_bytes());
    }

    fn jpeg_with_exif(fields: &[Field]) -> Vec<u8> {
        wrap_in_jpeg(&tiff_with(fields))
    }

    /// SOI, one APP1 Exif segment, EOI.
    fn wrap_in_jpeg(tiff: &[u8]) -> Vec<u8> {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_extracts_camera_date_and_dimensions() {
        let bytes = jpeg_with_exif(&[
            field(Tag::Make, ascii("Apple")),
            field(Tag::Model, ascii("iPhone 14 Pro")),
            field(Tag::DateTimeOriginal, ascii("2023:05:01 12:34:56")),
            field(Tag::PixelXDimension, Value::Long(vec![4032])),
            field(Tag::PixelYDimension, Value::Long(vec![3024])),
        ]);

        let metadata = ExifMetadataExtractor::new().extract(&bytes).unwrap();

        assert_eq!(metadata.make.as_deref(), Some("Apple"));
        assert_eq!(metadata.model.as_deref(), Some("iPhone 14 Pro"));
        assert_eq!(metadata.date_taken.as_deref(), Some("2023-05-01T12:34:56"));
        assert_eq!(metadata.width, Some(4032));
        assert_eq!(metadata.height, Some(3024));
        assert!(!metadata.has_gps());
    }

    #[test]
    fn test_date_keeps_recorded_offset() {
        let bytes = jpeg_with_exif(&[
            field(Tag::DateTimeOriginal, ascii("2021:12:24 18:00:05")),
            field(Tag::OffsetTimeOriginal, ascii("+02:00")),
        ]);

        let metadata = ExifMetadataExtractor::new().extract(&bytes).unwrap();
        assert_eq!(metadata.date_taken.as_deref(), Some("2021-12-24T18:00:05+02:00"));
    }

    #[test]
    fn test_gps_position_with_hemisphere_refs() {
        let bytes = jpeg_with_exif(&[
            field(Tag::GPSLatitudeRef, ascii("S")),
            field(Tag::GPSLatitude, dms(33, 51, 3096)),
            field(Tag::GPSLongitudeRef, ascii("E")),
            field(Tag::GPSLongitude, dms(151, 12, 3600)),
            field(Tag::GPSAltitudeRef, Value::Byte(vec![0])),
            field(Tag::GPSAltitude, Value::Rational(vec![Rational { num: 58, denom: 1 }])),
        ]);

        let metadata = ExifMetadataExtractor::new().extract(&bytes).unwrap();
        let gps = metadata.gps.expect("position");

        assert!((gps.latitude - -33.8586).abs() < 1e-6);
        assert!((gps.longitude - 151.21).abs() < 1e-6);
        assert_eq!(gps.altitude, Some(58.0));
    }

    #[test]
    fn test_altitude_below_sea_level_is_negative() {
        let bytes = jpeg_with_exif(&[
            field(Tag::GPSLatitudeRef, ascii("N")),
            field(Tag::GPSLatitude, dms(31, 30, 0)),
            field(Tag::GPSLongitudeRef, ascii("E")),
            field(Tag::GPSLongitude, dms(35, 30, 0)),
            field(Tag::GPSAltitudeRef, Value::Byte(vec![1])),
            field(Tag::GPSAltitude, Value::Rational(vec![Rational { num: 430, denom: 1 }])),
        ]);

        let gps = ExifMetadataExtractor::new().extract(&bytes).unwrap().gps.unwrap();
        assert_eq!(gps.altitude, Some(-430.0));
    }

    #[test]
    fn test_gps_without_longitude_is_no_gps_but_keeps_other_tags() {
        let bytes = jpeg_with_exif(&[
            field(Tag::Make, ascii("Canon")),
            field(Tag::GPSLatitudeRef, ascii("N")),
            field(Tag::GPSLatitude, dms(48, 51, 3024)),
            field(Tag::GPSAltitude, Value::Rational(vec![Rational { num: 35, denom: 1 }])),
        ]);

        let metadata = ExifMetadataExtractor::new().extract(&bytes).unwrap();
        assert_eq!(metadata.gps, None);
        assert_eq!(metadata.make.as_deref(), Some("Canon"));
    }

    #[test]
    fn test_gps_pointer_out_of_range_keeps_camera_tags() {
        let mut tiff = tiff_with(&[
            field(Tag::Make, ascii("Canon")),
            field(Tag::Model, ascii("EOS R6")),
            field(Tag::GPSLatitudeRef, ascii("N")),
            field(Tag::GPSLatitude, dms(48, 51, 3024)),
        ]);
        redirect_gps_pointer(&mut tiff, 0x00FF_FF00);

        let metadata = ExifMetadataExtractor::new()
            .extract(&wrap_in_jpeg(&tiff))
            .unwrap();
        assert_eq!(metadata.make.as_deref(), Some("Canon"));
        assert_eq!(metadata.model.as_deref(), Some("EOS R6"));
        assert_eq!(metadata.gps, None);
    }

    #[test]
    fn test_zero_denominator_coordinate_is_no_gps() {
        let bytes = jpeg_with_exif(&[
            field(
                Tag::GPSLatitude,
                Value::Rational(vec![
                    Rational { num: 48, denom: 0 },
                    Rational { num: 0, denom: 1 },
                    Rational { num: 0, denom: 1 },
                ]),
            ),
            field(Tag::GPSLongitude, dms(2, 17, 4020)),
        ]);

        let metadata = ExifMetadataExtractor::new().extract(&bytes).unwrap();
        assert!(!metadata.has_gps());
    }

    #[test]
    fn test_missing_dimensions_are_unknown_not_zero() {
        let bytes = jpeg_with_exif(&[
            field(Tag::Make, ascii("Apple")),
            field(Tag::PixelXDimension, Value::Long(vec![0])),
        ]);

        let metadata = ExifMetadataExtractor::new().extract(&bytes).unwrap();
        assert_eq!(metadata.width, None);
        assert_eq!(metadata.height, None);
    }

    #[test]
    fn test_png_without_exif_uses_header_dimensions() {
        let metadata = ExifMetadataExtractor::new().extract(&png(3, 2)).unwrap();

        assert_eq!(metadata.width, Some(3));
        assert_eq!(metadata.height, Some(2));
        assert_eq!(metadata.make, None);
        assert_eq!(metadata.date_taken, None);
        assert!(!metadata.has_gps());
    }

    #[test]
    fn test_dimension_probe_can_be_disabled() {
        let metadata = ExifMetadataExtractor::without_dimension_probe()
            .extract(&png(3, 2))
            .unwrap();

        assert_eq!(metadata, PhotoMetadata::default());
    }

    #[test]
    fn test_unreadable_bytes_fail() {
        let extractor = ExifMetadataExtractor::default();

        assert!(matches!(
            extractor.extract(b"definitely not an image"),
            Err(MetadataError::ExtractionFailed(_))
        ));
        assert!(matches!(
            extractor.extract(&[]),
            Err(MetadataError::UnsupportedFormat(_))
        ));
    }
}
