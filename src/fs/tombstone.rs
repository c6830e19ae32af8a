//! Tombstone management: the dual representation of "deleted".
//!
//! A deletion is projected two ways — a `deleted` flag on the metadata row
//! and a zero-byte `<path>.delete` marker file in the content tree. The
//! marker is the signal an external consumer watches for; the flag is what
//! keeps the path out of listings while preserving its history. This module
//! is the only writer of either projection, so they cannot drift: the
//! resurrection path in the reconciliation engine goes through
//! [`clear_marker`] rather than touching the marker itself.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

use chrono::Utc;
use log::{debug, info, warn};

use crate::error::{CacheError, CacheResult};
use crate::paths;

use super::GhostFs;

pub(super) fn mark_deleted(fs_handle: &GhostFs, path: &str) -> CacheResult<()> {
    let path = paths::clean(path)?;
    let _guard = fs_handle.mutation_guard();

    // Directory records are never tombstoned; their only deletion path is
    // empty-directory removal.
    if fs_handle
        .store()
        .get(&path)?
        .is_some_and(|rec| rec.is_dir)
    {
        return Err(CacheError::IsADirectory { path });
    }

    // 1. Content removal; absence is the expected steady state when the
    //    local consumer already processed the file.
    let content = paths::content_path(fs_handle.root(), &path);
    match fs::remove_file(&content) {
        Ok(()) => debug!("removed content file for {path}"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    // 2. Zero-byte marker, parents first.
    let marker = paths::marker_path(fs_handle.root(), &path);
    if let Some(parent) = marker.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(&marker)?;

    // 3. Flag the record; size and hash stay as last known.
    if fs_handle.store().set_deleted(&path, Utc::now())? {
        info!("tombstoned {path}");
    } else {
        warn!("tombstoned unknown path {path}; marker written without a record");
    }
    Ok(())
}

/// Remove the marker file for `path` if one exists.
///
/// Called when a tombstoned path is resurrected with new content; a marker
/// that outlives its tombstone would keep signaling a deletion that no longer
/// holds.
pub(super) fn clear_marker(root: &Path, path: &str) -> CacheResult<()> {
    match fs::remove_file(paths::marker_path(root, path)) {
        Ok(()) => {
            debug!("cleared stale tombstone marker for {path}");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
