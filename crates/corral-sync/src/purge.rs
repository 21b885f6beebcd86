//! Removal of checkouts that no longer belong to a configured catalog

use crate::error::Result;
use crate::loader::child_dirs;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use std::fs;
use tracing::{debug, info};

/// Marker file that protects a checkout from purging
pub const NO_PURGE_MARKER: &str = ".nopurge";

/// Delete every checkout under `root` whose name is not in `keep`
///
/// Checkouts holding a [`NO_PURGE_MARKER`] file are left alone. Returns the
/// removed directories.
pub fn purge_unlisted(root: &Utf8Path, keep: &BTreeSet<String>) -> Result<Vec<Utf8PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    for dir in child_dirs(root)? {
        let Some(name) = dir.file_name() else {
            continue;
        };
        if keep.contains(name) {
            continue;
        }
        if dir.join(NO_PURGE_MARKER).exists() {
            debug!("Keeping {} ({} present)", dir, NO_PURGE_MARKER);
            continue;
        }

        info!("Removing unconfigured catalog checkout {}", dir);
        fs::remove_dir_all(&dir)?;
        removed.push(dir);
    }

    Ok(removed)
}
