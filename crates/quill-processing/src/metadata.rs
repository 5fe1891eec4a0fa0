//! Image metadata extraction
//!
//! Dimensions come from the image header; GPS position and capture date from EXIF.

use std::io::Cursor;

use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{Exif, In, Tag, Value};
use image::{ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};

use quill_core::models::ImageFields;

/// Divisors turning degrees/minutes/seconds into decimal degrees.
const DMS_DIVISION: [f64; 3] = [1.0, 60.0, 3600.0];

/// Coordinates are rounded to 8 digits after the decimal point.
const DECIMAL_SF: f64 = 100_000_000.0;

const LAT_MAX: f64 = 90.0;
const LON_MAX: f64 = 180.0;

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Descriptive metadata derived from image bytes. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub date_taken: Option<DateTime<Utc>>,
}

impl From<ImageMetadata> for ImageFields {
    fn from(meta: ImageMetadata) -> Self {
        ImageFields {
            width: meta.width,
            height: meta.height,
            lat: meta.lat,
            lon: meta.lon,
            date_taken: meta.date_taken,
        }
    }
}

/// Extract metadata from raw image bytes.
///
/// `declared_mime` is only used when the format cannot be sniffed from the bytes.
pub fn extract_image_metadata(data: &[u8], declared_mime: &str) -> ImageMetadata {
    let mut meta = ImageMetadata::default();

    if let Some((width, height)) = header_dimensions(data, declared_mime) {
        meta.width = i32::try_from(width).ok();
        meta.height = i32::try_from(height).ok();
    }

    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!(error = %e, "No readable EXIF data");
            return meta;
        }
    };

    if meta.width.is_none() || meta.height.is_none() {
        meta.width = exif_uint(&exif, Tag::PixelXDimension).and_then(|v| i32::try_from(v).ok());
        meta.height = exif_uint(&exif, Tag::PixelYDimension).and_then(|v| i32::try_from(v).ok());
    }

    if let Some((lat, lon)) = gps_coordinates(&exif) {
        meta.lat = Some(lat);
        meta.lon = Some(lon);
    }

    meta.date_taken = capture_date(&exif);

    meta
}

/// Read dimensions from the header only; no pixel data is decoded.
fn header_dimensions(data: &[u8], declared_mime: &str) -> Option<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?;

    let reader = if reader.format().is_some() {
        reader
    } else {
        let format = ImageFormat::from_mime_type(declared_mime)?;
        let mut reader = ImageReader::new(Cursor::new(data));
        reader.set_format(format);
        reader
    };

    match reader.into_dimensions() {
        Ok(dims) => Some(dims),
        Err(e) => {
            tracing::debug!(error = %e, "Could not read image header");
            None
        }
    }
}

fn exif_uint(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn exif_ascii(exif: &Exif, tag: Tag) -> Option<String> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_matches('\0').trim().to_string()),
        _ => None,
    }
}

/// DMS rationals to decimal degrees. Needs all three components.
fn dms_to_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Rational(parts) if parts.len() >= 3 => {
            let mut total = 0.0;
            for (part, divisor) in parts.iter().take(3).zip(DMS_DIVISION.iter()) {
                if part.denom == 0 {
                    return None;
                }
                total += part.to_f64() / divisor;
            }
            Some(total)
        }
        _ => None,
    }
}

fn signed_coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag, max: f64) -> Option<f64> {
    let magnitude = dms_to_decimal(&exif.get_field(value_tag, In::PRIMARY)?.value)?;
    let reference = exif_ascii(exif, ref_tag).unwrap_or_default();

    let signed = match reference.to_ascii_uppercase().as_str() {
        "S" | "W" => -magnitude,
        _ => magnitude,
    };

    let rounded = (signed * DECIMAL_SF).round() / DECIMAL_SF;
    (rounded.is_finite() && rounded.abs() <= max).then_some(rounded)
}

/// Both coordinates or neither.
fn gps_coordinates(exif: &Exif) -> Option<(f64, f64)> {
    let lat = signed_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, LAT_MAX)?;
    let lon = signed_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, LON_MAX)?;
    Some((lat, lon))
}

/// `DateTimeOriginal`, falling back to `DateTime`. Interpreted as UTC.
fn capture_date(exif: &Exif) -> Option<DateTime<Utc>> {
    [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .filter_map(|tag| exif_ascii(exif, tag))
        .find_map(|raw| parse_exif_datetime(&raw))
}

fn parse_exif_datetime(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), EXIF_DATETIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
