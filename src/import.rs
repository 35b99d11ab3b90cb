//! Import orchestration for savedMedia2archive.
//!
//! This module drives a whole run:
//! - Pre-scanning the destination so finished items are not fetched again
//! - Downloading each manifest entry, one at a time
//! - Resolving the real file type and renaming accordingly
//! - Repairing video containers
//! - Writing the localized capture time and GPS position
//!
//! Per-item work is split in two: `plan_item` is pure and decides what should
//! happen to an entry (file name, URL, local time, location), and `Importer`
//! performs the I/O. Failures of a single item never stop the run; they are
//! reported through `ImportResult`.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use reqwest::Client;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs as tokio_fs;
use url::Url;

use crate::error::ItemError;
use crate::localize::{LocalizedTimestamp, localize, parse_capture_time};
use crate::location::{GeoCoordinate, parse_location};
use crate::manifest::{Manifest, MediaItem, MediaType};
use crate::media_type::{MediaKind, resolve_and_rename};
use crate::metadata::write_metadata;
use crate::repair::repair_container;
use crate::toolkit::MediaToolkit;

/// Suffix of files still being downloaded
pub const PARTIAL_SUFFIX: &str = ".part";

/// Zero-padded, 1-based file stem for a manifest position
pub fn index_stem(index: usize) -> String {
    format!("{index:05}")
}

/// Where an entry's bytes come from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Url(Url),
    Missing,
    Invalid(String),
}

/// Everything decided about a manifest entry before touching disk or network
#[derive(Debug, Clone)]
pub struct ItemPlan {
    /// 1-based position in the manifest
    pub index: usize,
    pub stem: String,
    pub source: Source,
    pub media_type: MediaType,
    pub coordinate: Option<GeoCoordinate>,
    /// `None` when the capture time is absent or unparsable
    pub timestamp: Option<LocalizedTimestamp>,
    /// Raw capture time that failed to parse
    pub bad_timestamp: Option<String>,
}

impl ItemPlan {
    /// Local time to write into the file, if known
    pub fn local_time(&self) -> Option<NaiveDateTime> {
        self.timestamp.map(|t| t.local)
    }

    /// Kind assumed from the manifest label, used when detection is inconclusive
    pub fn fallback_kind(&self) -> MediaKind {
        match self.media_type {
            MediaType::Photo => MediaKind::Image,
            MediaType::Video => MediaKind::Video,
        }
    }
}

fn parse_source(url: Option<&str>) -> Source {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return Source::Missing;
    };

    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Source::Url(parsed),
        _ => Source::Invalid(url.to_string()),
    }
}

/// Decides what to do with the manifest entry at 1-based `index`
pub fn plan_item(index: usize, item: &MediaItem) -> ItemPlan {
    let coordinate = parse_location(item.location_text.as_deref());

    let (timestamp, bad_timestamp) = match item.captured_at_utc.as_deref() {
        Some(raw) => match parse_capture_time(raw) {
            Some(utc) => (Some(localize(utc, coordinate)), None),
            None => (None, Some(raw.to_string())),
        },
        None => (None, None),
    };

    ItemPlan {
        index,
        stem: index_stem(index),
        source: parse_source(item.download_url.as_deref()),
        media_type: item.media_type,
        coordinate,
        timestamp,
        bad_timestamp,
    }
}

/// Stems of finished files in `dir`; partial downloads and hidden files are ignored
pub fn scan_existing(dir: &Path) -> std::io::Result<HashSet<String>> {
    let mut stems = HashSet::new();

    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || name.ends_with(PARTIAL_SUFFIX) {
            continue;
        }
        let stem = name.split('.').next().unwrap_or_default();
        stems.insert(stem.to_string());
    }

    Ok(stems)
}

/// Why an item was not downloaded
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    AlreadyPresent,
    MissingUrl,
    InvalidUrl(String),
}

/// Outcome of processing one manifest item
#[derive(Debug)]
pub enum ImportResult {
    /// Downloaded, resolved and tagged without problems
    Imported { index: usize, path: PathBuf },
    /// Saved to disk, but a later step failed
    Partial {
        index: usize,
        path: PathBuf,
        errors: Vec<ItemError>,
    },
    /// Not attempted
    Skipped { index: usize, reason: SkipReason },
    /// Nothing usable was saved
    Failed { index: usize, error: ItemError },
}

/// Counts of each outcome over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub partial: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ImportSummary {
    pub fn from_results(results: &[ImportResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result {
                ImportResult::Imported { .. } => summary.imported += 1,
                ImportResult::Partial { .. } => summary.partial += 1,
                ImportResult::Skipped { .. } => summary.skipped += 1,
                ImportResult::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Rebuilds the archive from a manifest, one item at a time
pub struct Importer<T: MediaToolkit> {
    /// HTTP client for downloading media
    client: Client,
    /// Destination directory
    out_dir: PathBuf,
    toolkit: T,
    repair_videos: bool,
}

impl<T: MediaToolkit> Importer<T> {
    pub fn new(out_dir: PathBuf, toolkit: T) -> Self {
        Self {
            client: Client::new(),
            out_dir,
            toolkit,
            repair_videos: true,
        }
    }

    pub fn with_repair(mut self, repair_videos: bool) -> Self {
        self.repair_videos = repair_videos;
        self
    }

    /// Processes every manifest item in order.
    ///
    /// Only setup problems (destination cannot be created or listed) are
    /// returned as errors; per-item failures are in the result list.
    pub async fn run(&self, manifest: &Manifest) -> Result<Vec<ImportResult>> {
        tokio_fs::create_dir_all(&self.out_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.out_dir.display()))?;

        let existing = scan_existing(&self.out_dir)
            .with_context(|| format!("Failed to list {}", self.out_dir.display()))?;
        info!(
            "Found {} existing files in {}",
            existing.len(),
            self.out_dir.display()
        );

        let mut results = Vec::with_capacity(manifest.item_count());
        for (position, item) in manifest.items.iter().enumerate() {
            let plan = plan_item(position + 1, item);
            results.push(self.import_item(&plan, &existing).await);
        }

        Ok(results)
    }

    /// Runs the whole per-item pipeline
    pub async fn import_item(&self, plan: &ItemPlan, existing: &HashSet<String>) -> ImportResult {
        let index = plan.index;

        if existing.contains(&plan.stem) {
            debug!("Skipping {}: already present", plan.stem);
            return ImportResult::Skipped {
                index,
                reason: SkipReason::AlreadyPresent,
            };
        }

        let url = match &plan.source {
            Source::Url(url) => url,
            Source::Missing => {
                debug!("Skipping {}: no download URL", plan.stem);
                return ImportResult::Skipped {
                    index,
                    reason: SkipReason::MissingUrl,
                };
            }
            Source::Invalid(raw) => {
                warn!("Skipping {}: invalid download URL {raw:?}", plan.stem);
                return ImportResult::Skipped {
                    index,
                    reason: SkipReason::InvalidUrl(raw.clone()),
                };
            }
        };

        println!("Downloading {}", plan.stem);
        let partial = self.out_dir.join(format!("{}{PARTIAL_SUFFIX}", plan.stem));
        if let Err(error) = self.download(url, &partial).await {
            println!("Failed: {error}");
            let _ = tokio_fs::remove_file(&partial).await;
            return ImportResult::Failed { index, error };
        }

        let resolved = match resolve_and_rename(&self.toolkit, &partial, &plan.stem).await {
            Ok(resolved) => resolved,
            Err(err) => {
                println!("Failed: could not rename {}: {err}", partial.display());
                return ImportResult::Failed {
                    index,
                    error: ItemError::Io(err),
                };
            }
        };

        let mut errors = Vec::new();
        let kind = resolved.kind();
        let path = resolved.path;
        if let Some(err) = resolved.detection_error {
            errors.push(ItemError::Detection(err));
        }

        if kind == Some(MediaKind::Video) && self.repair_videos {
            if let Err(err) = repair_container(&self.toolkit, &path).await {
                errors.push(err);
            }
        }

        match (plan.local_time(), &plan.bad_timestamp) {
            (Some(local), _) => {
                let kind = kind.unwrap_or_else(|| plan.fallback_kind());
                if let Err(failed) =
                    write_metadata(&self.toolkit, &path, kind, local, plan.coordinate).await
                {
                    errors.extend(failed);
                }
            }
            (None, Some(raw)) => errors.push(ItemError::Timestamp(raw.clone())),
            (None, None) => debug!("No capture time for {}, leaving it untagged", plan.stem),
        }

        if errors.is_empty() {
            ImportResult::Imported { index, path }
        } else {
            for err in &errors {
                println!("Warning: {}: {err}", path.display());
            }
            ImportResult::Partial {
                index,
                path,
                errors,
            }
        }
    }

    /// Downloads `url` to `path` in a single attempt
    async fn download(&self, url: &Url, path: &Path) -> Result<(), ItemError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        tokio_fs::write(path, bytes).await?;

        debug!("Saved {url} to {}", path.display());
        Ok(())
    }
}
