//! Writing corrected capture time and GPS position into archived files.
//!
//! Tag planning is pure (`plan_tags`) so the per-format schema can be tested
//! without touching disk. `write_metadata` hands the plan to a
//! `MediaToolkit` and then stamps the filesystem times.
//!
//! Still images get EXIF date fields plus GPS with explicit hemisphere
//! references. Videos get the QuickTime date fields and an ISO 6709 location
//! string, written to both the `Keys` and `UserData` atoms since different
//! viewers read different slots.

use chrono::{Local, NaiveDateTime, TimeZone};
use filetime::FileTime;
use log::{debug, warn};
use std::path::Path;

use crate::error::ItemError;
use crate::location::GeoCoordinate;
use crate::media_type::MediaKind;
use crate::toolkit::MediaToolkit;

/// Naive local time as stored in EXIF and QuickTime date tags
pub const TAG_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// A single tag write, e.g. `-DateTimeOriginal=2025:06:15 08:00:00`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAssignment {
    pub tag: &'static str,
    pub value: String,
    /// Write the value verbatim, bypassing exiftool's print conversion
    pub raw: bool,
}

impl TagAssignment {
    fn new(tag: &'static str, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
            raw: false,
        }
    }

    fn raw(tag: &'static str, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
            raw: true,
        }
    }

    pub fn to_exiftool_arg(&self) -> String {
        if self.raw {
            format!("-{}#={}", self.tag, self.value)
        } else {
            format!("-{}={}", self.tag, self.value)
        }
    }
}

/// Formats a timestamp the way EXIF/QuickTime date tags expect
pub fn format_tag_time(local: NaiveDateTime) -> String {
    local.format(TAG_TIME_FORMAT).to_string()
}

/// `+DD.DDDDDD+DDD.DDDDDD/` as used by QuickTime location atoms
pub fn iso6709(coordinate: GeoCoordinate) -> String {
    format!("{:+010.6}{:+011.6}/", coordinate.latitude, coordinate.longitude)
}

/// Hemisphere reference letters for a coordinate
pub fn hemisphere_refs(coordinate: GeoCoordinate) -> (&'static str, &'static str) {
    let lat_ref = if coordinate.latitude < 0.0 { "S" } else { "N" };
    let lon_ref = if coordinate.longitude < 0.0 { "W" } else { "E" };
    (lat_ref, lon_ref)
}

/// Builds the tag writes for one file
pub fn plan_tags(
    kind: MediaKind,
    local: NaiveDateTime,
    coordinate: Option<GeoCoordinate>,
) -> Vec<TagAssignment> {
    let stamp = format_tag_time(local);

    match kind {
        MediaKind::Image => {
            let mut tags = vec![
                TagAssignment::new("DateTimeOriginal", &stamp),
                TagAssignment::new("CreateDate", &stamp),
                TagAssignment::new("ModifyDate", &stamp),
            ];

            if let Some(coordinate) = coordinate {
                let (lat_ref, lon_ref) = hemisphere_refs(coordinate);
                tags.extend([
                    TagAssignment::new("GPSLatitude", format!("{:.6}", coordinate.latitude.abs())),
                    TagAssignment::new("GPSLatitudeRef", lat_ref),
                    TagAssignment::new(
                        "GPSLongitude",
                        format!("{:.6}", coordinate.longitude.abs()),
                    ),
                    TagAssignment::new("GPSLongitudeRef", lon_ref),
                ]);
            }
            tags
        }
        MediaKind::Video => {
            let mut tags = vec![
                TagAssignment::new("CreateDate", &stamp),
                TagAssignment::new("ModifyDate", &stamp),
                TagAssignment::new("TrackCreateDate", &stamp),
                TagAssignment::new("TrackModifyDate", &stamp),
                TagAssignment::new("MediaCreateDate", &stamp),
                TagAssignment::new("MediaModifyDate", &stamp),
            ];

            if let Some(coordinate) = coordinate {
                let location = iso6709(coordinate);
                tags.push(TagAssignment::raw("Keys:GPSCoordinates", &location));
                tags.push(TagAssignment::raw("UserData:GPSCoordinates", location));
            }
            tags
        }
    }
}

/// Seconds since the epoch for a naive local time, read in the host time zone.
///
/// Ambiguous times take the earlier instant; times inside a DST gap fall back
/// to reading the value as UTC.
pub fn local_epoch_seconds(local: NaiveDateTime) -> i64 {
    match Local.from_local_datetime(&local).earliest() {
        Some(instant) => instant.timestamp(),
        None => local.and_utc().timestamp(),
    }
}

/// Sets modification and access time of `path` to `local`
pub fn set_file_times(path: &Path, local: NaiveDateTime) -> std::io::Result<()> {
    let stamp = FileTime::from_unix_time(local_epoch_seconds(local), 0);
    filetime::set_file_times(path, stamp, stamp)
}

/// Writes embedded tags, then filesystem times.
///
/// A tagging failure does not stop the filesystem times from being set. Every
/// step that failed is reported, tagging first.
pub async fn write_metadata<T: MediaToolkit>(
    toolkit: &T,
    path: &Path,
    kind: MediaKind,
    local: NaiveDateTime,
    coordinate: Option<GeoCoordinate>,
) -> Result<(), Vec<ItemError>> {
    let tags = plan_tags(kind, local, coordinate);
    debug!("Writing {} tags to {}", tags.len(), path.display());

    let mut errors = Vec::new();
    if let Err(err) = toolkit.write_tags(path, &tags).await {
        warn!("Could not write metadata to {}: {err}", path.display());
        errors.push(ItemError::Tagging(err));
    }

    if let Err(err) = set_file_times(path, local) {
        warn!("Could not set file times on {}: {err}", path.display());
        errors.push(ItemError::Io(err));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
