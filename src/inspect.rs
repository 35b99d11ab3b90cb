//! Read-back of the EXIF fields this tool writes into still images.
//!
//! Lets a user check what a photo viewer will see for an archived file:
//! the capture time and the GPS position with hemisphere references applied.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use exif::{Exif, In, Tag, Value};
use log::warn;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::metadata::TAG_TIME_FORMAT;

/// Capture metadata embedded in an image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedMetadata {
    /// `DateTimeOriginal`, as naive local time
    pub captured_at: Option<NaiveDateTime>,
    /// Signed decimal latitude
    pub latitude: Option<f64>,
    /// Signed decimal longitude
    pub longitude: Option<f64>,
}

/// Reads capture time and GPS from an image.
///
/// A file without readable EXIF yields empty metadata; only a file that
/// cannot be opened is an error.
pub fn read_embedded(image_path: &Path) -> Result<EmbeddedMetadata> {
    let file = File::open(image_path)
        .with_context(|| format!("Failed to open {}", image_path.display()))?;
    let mut reader = BufReader::new(file);

    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            warn!("No EXIF data in {}: {}", image_path.display(), e);
            return Ok(EmbeddedMetadata::default());
        }
    };

    Ok(EmbeddedMetadata {
        captured_at: ascii_field(&exif, Tag::DateTimeOriginal)
            .and_then(|s| parse_tag_time(&s)),
        latitude: signed_degrees(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, "S"),
        longitude: signed_degrees(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, "W"),
    })
}

/// Parses `YYYY:MM:DD HH:MM:SS`
pub fn parse_tag_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TAG_TIME_FORMAT).ok()
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match field.value {
        Value::Ascii(ref vec) => vec
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).to_string()),
        _ => None,
    }
}

/// Degrees/minutes/seconds plus a hemisphere reference, as signed decimal
fn signed_degrees(exif: &Exif, value_tag: Tag, ref_tag: Tag, negative_ref: &str) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    if parts.len() < 3 {
        return None;
    }

    let magnitude = dms_to_decimal(parts[0].to_f64(), parts[1].to_f64(), parts[2].to_f64());
    let reference = ascii_field(exif, ref_tag)?;

    if reference.trim() == negative_ref {
        Some(-magnitude)
    } else {
        Some(magnitude)
    }
}

fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}
