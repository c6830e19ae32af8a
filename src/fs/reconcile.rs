//! The reconciliation engine: skip/create/update for one candidate file.
//!
//! The decision is always compare-before-write. Given the stored record for
//! the candidate's path:
//!
//! 1. no record, or only a tombstoned one — create (a directory record at
//!    the path is rejected outright instead of being replaced);
//! 2. sizes differ — update;
//! 3. modification times are not exactly equal — update;
//! 4. the candidate carries a digest in the supported algorithm and it
//!    differs from the stored one — update;
//! 5. otherwise — skip, returning the stored record with zero content I/O.
//!
//! On create/update the engine materializes ancestor directory records,
//! streams the content to disk while hashing it in the same pass, and only
//! then commits the metadata row. A streaming failure aborts before the
//! upsert, leaving the previous record intact.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::digest::{Digest, HashingWriter, SUPPORTED_DIGEST};
use crate::error::{CacheError, CacheResult};
use crate::paths;
use crate::store::FileRecord;

use super::{tombstone, GhostFs};

/// An incoming file as described by the remote source.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Logical path of the file.
    pub path: String,
    /// Size claimed by the source, used for change detection only; the
    /// stored size is whatever actually lands on disk.
    pub size: u64,
    /// Modification time on the source, compared for exact inequality.
    pub mod_time: DateTime<Utc>,
    /// Content digest from the source, if it computed one.
    pub digest: Option<Digest>,
}

impl Candidate {
    pub fn new(path: impl Into<String>, size: u64, mod_time: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            size,
            mod_time,
            digest: None,
        }
    }

    /// Attach a source-side digest for change detection.
    #[must_use]
    pub fn with_digest(mut self, digest: Digest) -> Self {
        self.digest = Some(digest);
        self
    }
}

/// What the engine decided to do with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No live file record existed; content was written.
    Created,
    /// A live record existed but differed; content was rewritten.
    Updated,
    /// The stored record matched; no content I/O was performed.
    Skipped,
}

/// Result of a reconciliation: the authoritative record plus the decision.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub record: FileRecord,
    pub outcome: Outcome,
}

pub(super) fn run<R: Read>(
    fs_handle: &GhostFs,
    candidate: Candidate,
    content: R,
) -> CacheResult<Reconciled> {
    let path = paths::clean(&candidate.path)?;
    let _guard = fs_handle.mutation_guard();

    let existing = fs_handle.store().get(&path)?;

    // A directory record at the candidate's own path is a collision, not a
    // create; silently replacing it would orphan everything listed under it.
    if existing.as_ref().is_some_and(|rec| rec.is_dir) {
        return Err(CacheError::IsADirectory { path });
    }

    let live = existing.as_ref().filter(|rec| rec.is_live_file());

    if let Some(current) = live {
        if !needs_update(current, &candidate) {
            debug!("skipping identical file: {path}");
            return Ok(Reconciled {
                record: current.clone(),
                outcome: Outcome::Skipped,
            });
        }
    }
    let outcome = if live.is_some() {
        Outcome::Updated
    } else {
        Outcome::Created
    };

    // All ancestor rows commit as one unit before any content is written.
    fs_handle.store().materialize_dirs(paths::ancestors(&path))?;

    let target = paths::content_path(fs_handle.root(), &path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(&target)?;
    let mut writer = HashingWriter::new(BufWriter::new(file));
    let mut content = content;
    io::copy(&mut content, &mut writer)?;
    let (mut inner, digest, written) = writer.finalize();
    inner.flush()?;

    // Resurrection: the stale marker must not outlive the live record.
    if existing.as_ref().is_some_and(|rec| rec.deleted) {
        tombstone::clear_marker(fs_handle.root(), &path)?;
    }

    let record = FileRecord {
        path,
        size: written,
        mod_time: candidate.mod_time,
        has_hash: true,
        hash: digest.hex,
        deleted: false,
        is_dir: false,
    };
    fs_handle.store().upsert(&record)?;
    info!(
        "{} {} ({} bytes)",
        match outcome {
            Outcome::Created => "created",
            Outcome::Updated => "updated",
            Outcome::Skipped => unreachable!("skip returns early"),
        },
        record.path,
        written
    );

    Ok(Reconciled { record, outcome })
}

/// The compare step of the decision policy, rules 2-4.
fn needs_update(existing: &FileRecord, candidate: &Candidate) -> bool {
    if existing.size != candidate.size {
        return true;
    }
    if existing.mod_time != candidate.mod_time {
        return true;
    }
    if let Some(digest) = &candidate.digest {
        // Only a digest in the shared algorithm is comparable; anything else
        // cannot force a transfer on its own.
        if digest.kind == SUPPORTED_DIGEST && digest.hex != existing.hash {
            return true;
        }
    }
    false
}
