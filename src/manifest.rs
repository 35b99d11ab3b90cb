//! Saved Media manifest model.
//!
//! The export is a JSON document with a top-level `"Saved Media"` array.
//! Every field on an entry is optional in practice, so missing values
//! deserialize to empty/`None` and are dealt with per item later.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// Media-type label on a manifest entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MediaType {
    #[default]
    Photo,
    Video,
}

impl MediaType {
    /// `video` in any case is a video; every other label is a photo
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("video") {
            MediaType::Video
        } else {
            MediaType::Photo
        }
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.map(|l| Self::from_label(&l)).unwrap_or_default())
    }
}

/// A single entry of the export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "Media Type", default)]
    pub media_type: MediaType,
    #[serde(rename = "Media Download Url", default)]
    pub download_url: Option<String>,
    /// `YYYY-MM-DD HH:MM:SS UTC`
    #[serde(rename = "Date", default)]
    pub captured_at_utc: Option<String>,
    /// `Latitude, Longitude: <lat>, <lon>`
    #[serde(rename = "Location", default)]
    pub location_text: Option<String>,
}

/// The parsed export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "Saved Media", default)]
    pub items: Vec<MediaItem>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Manifest is not valid Saved Media JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest from {}", path.display()))?;

        Self::from_json(&json)
            .with_context(|| format!("Failed to parse manifest from {}", path.display()))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
