//! Repair of possibly truncated video containers.
//!
//! The video is remuxed with stream copy into a hidden temporary file next
//! to it, then moved over the original. If the remux fails the temporary is
//! discarded and the original is left as it was.

use log::{debug, warn};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::ItemError;
use crate::toolkit::MediaToolkit;

/// Hidden sibling path the remuxer writes to; keeps the extension so the
/// muxer picks the same container format
fn temporary_path(path: &Path) -> PathBuf {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    path.with_file_name(format!(".repair-{}.{extension}", Uuid::new_v4()))
}

/// Remuxes `path` in place
pub async fn repair_container<T: MediaToolkit>(toolkit: &T, path: &Path) -> Result<(), ItemError> {
    let temporary = temporary_path(path);
    debug!("Repairing {} via {}", path.display(), temporary.display());

    if let Err(err) = toolkit.remux(path, &temporary).await {
        warn!("Could not repair {}: {err}", path.display());
        if temporary.exists() {
            if let Err(cleanup) = std::fs::remove_file(&temporary) {
                debug!("Could not remove {}: {cleanup}", temporary.display());
            }
        }
        return Err(ItemError::Repair(err));
    }

    std::fs::rename(&temporary, path)?;
    Ok(())
}
