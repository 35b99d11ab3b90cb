//! Resolution of a downloaded file's real type and canonical extension.
//!
//! The manifest's media-type label is only a hint; the bytes are sniffed by
//! the toolkit and the file is renamed to match. Anything the sniffer cannot
//! identify, or fails on, ends up as `.bin` instead of failing the item.

use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::error::ToolError;
use crate::toolkit::MediaToolkit;

/// Extension used when the type is unknown or could not be detected
pub const FALLBACK_EXTENSION: &str = ".bin";

/// Detected type token to canonical extension
const EXTENSIONS: &[(&str, &str)] = &[
    ("jpeg", ".jpg"),
    ("jpg", ".jpg"),
    ("heic", ".heic"),
    ("png", ".png"),
    ("webp", ".webp"),
    ("mp4", ".mp4"),
    ("mov", ".mov"),
];

/// Whether a file is a still image or a video, which decides the tag schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Kind implied by a canonical extension; `None` for `.bin`
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            ".jpg" | ".heic" | ".png" | ".webp" => Some(MediaKind::Image),
            ".mp4" | ".mov" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// Maps a sniffed type token to its canonical extension
pub fn extension_for(token: &str) -> &'static str {
    let token = token.trim().to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(known, _)| *known == token)
        .map(|(_, extension)| *extension)
        .unwrap_or(FALLBACK_EXTENSION)
}

/// A downloaded file after its type has been resolved
#[derive(Debug)]
pub struct ResolvedFile {
    /// Path after renaming
    pub path: PathBuf,
    /// Canonical extension, including the leading dot
    pub extension: &'static str,
    /// Set when the sniffer failed and the fallback extension was used
    pub detection_error: Option<ToolError>,
}

impl ResolvedFile {
    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_extension(self.extension)
    }
}

/// Sniffs `path` and renames it to `<stem><extension>` in the same directory
pub async fn resolve_and_rename<T: MediaToolkit>(
    toolkit: &T,
    path: &Path,
    stem: &str,
) -> std::io::Result<ResolvedFile> {
    let (extension, detection_error) = match toolkit.read_type(path).await {
        Ok(token) => {
            debug!("Detected type {token:?} for {}", path.display());
            (extension_for(&token), None)
        }
        Err(err) => {
            warn!("Could not detect type of {}: {err}", path.display());
            (FALLBACK_EXTENSION, Some(err))
        }
    };

    let target = path.with_file_name(format!("{stem}{extension}"));
    if target != path {
        std::fs::rename(path, &target)?;
    }

    Ok(ResolvedFile {
        path: target,
        extension,
        detection_error,
    })
}
