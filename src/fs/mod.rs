//! The ghostfs façade: a metadata-indexed content cache.
//!
//! [`GhostFs`] sits between a remote data source and a local consumer. The
//! outer sync driver discovers state through [`GhostFs::list`] and
//! [`GhostFs::lookup`], feeds each candidate file to [`GhostFs::reconcile`],
//! and routes deletions through [`GhostFs::mark_deleted`]. Metadata lives in
//! a SQLite table under the storage root; content files and zero-byte
//! tombstone markers live in the same tree. The two are deliberately not
//! updated atomically with each other — a crash between them is healed by the
//! next reconciliation pass for that path.

pub mod reconcile;
pub mod tombstone;

use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::digest::{DigestKind, SUPPORTED_DIGEST};
use crate::error::{CacheError, CacheResult};
use crate::paths;
use crate::store::{Entry, FileRecord, MetaStore, DB_FILE_NAME};

pub use reconcile::{Candidate, Outcome, Reconciled};

/// A content cache rooted at one storage directory.
///
/// All components receive the store by reference through this handle; there
/// is no ambient global state. One `GhostFs` per storage root.
pub struct GhostFs {
    root: PathBuf,
    store: MetaStore,
    // Single-writer critical section: held across the whole
    // check-then-content-write-then-metadata-commit sequence of every
    // mutating operation, so two reconciliations of the same path cannot
    // interleave.
    mutation: Mutex<()>,
}

impl GhostFs {
    /// Open the cache at `root`, creating the directory and the metadata
    /// schema if needed.
    pub fn open(root: impl Into<PathBuf>) -> CacheResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let store = MetaStore::open(&root.join(DB_FILE_NAME))?;
        info!("ghostfs opened at {}", root.display());
        Ok(Self {
            root,
            store,
            mutation: Mutex::new(()),
        })
    }

    /// The storage root holding the database, content files, and markers.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Timestamp precision of the store.
    #[must_use]
    pub fn precision(&self) -> Duration {
        Duration::from_nanos(1)
    }

    /// The single content-digest algorithm the store supports.
    #[must_use]
    pub fn digest_kind(&self) -> DigestKind {
        SUPPORTED_DIGEST
    }

    fn mutation_guard(&self) -> MutexGuard<'_, ()> {
        self.mutation.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// One level of child entries under `dir` (`""` for the top level).
    /// Tombstoned rows are excluded; deeper descendants are not flattened in.
    pub fn list(&self, dir: &str) -> CacheResult<Vec<Entry>> {
        let dir = paths::clean_dir(dir)?;
        let entries: Vec<Entry> = self
            .store
            .list_prefix(&dir)?
            .into_iter()
            .filter(|rec| paths::parent(&rec.path) == dir)
            .map(|rec| {
                if rec.is_dir {
                    Entry::Dir {
                        path: rec.path,
                        mod_time: rec.mod_time,
                    }
                } else {
                    Entry::File(rec)
                }
            })
            .collect();
        debug!("listed {} entries under {dir:?}", entries.len());
        Ok(entries)
    }

    /// The live file record at an exact path.
    ///
    /// Tombstoned and directory rows are reported as [`CacheError::NotFound`]
    /// even though the row exists.
    pub fn lookup(&self, path: &str) -> CacheResult<FileRecord> {
        let path = paths::clean(path)?;
        match self.store.get(&path)? {
            Some(rec) if rec.is_live_file() => Ok(rec),
            _ => Err(CacheError::NotFound { path }),
        }
    }

    /// The stored record at a path regardless of tombstone or directory
    /// status. Useful for audit; normal reads go through [`GhostFs::lookup`].
    pub fn store_record(&self, path: &str) -> CacheResult<Option<FileRecord>> {
        let path = paths::clean(path)?;
        self.store.get(&path)
    }

    /// Decide whether `candidate`'s content must be transferred, and if so
    /// stream it from `content` into the cache. See [`reconcile`].
    pub fn reconcile<R: Read>(&self, candidate: Candidate, content: R) -> CacheResult<Reconciled> {
        reconcile::run(self, candidate, content)
    }

    /// Record a remote-side deletion: remove content, drop a marker file,
    /// and tombstone the record.
    pub fn mark_deleted(&self, path: &str) -> CacheResult<()> {
        tombstone::mark_deleted(self, path)
    }

    /// Materialize a directory without content: the content-tree directory
    /// plus synthetic records for the path and all its ancestors.
    pub fn mkdir(&self, dir: &str) -> CacheResult<()> {
        let dir = paths::clean(dir)?;
        let _guard = self.mutation_guard();
        // Materialize first: it is also the check that no ancestor (or the
        // path itself) already exists as a live file.
        let dirs: Vec<&str> = paths::ancestors(&dir)
            .chain(std::iter::once(dir.as_str()))
            .collect();
        self.store.materialize_dirs(dirs)?;
        fs::create_dir_all(paths::content_path(&self.root, &dir))?;
        info!("mkdir {dir}");
        Ok(())
    }

    /// Remove a directory if nothing live remains under it.
    ///
    /// Fails with [`CacheError::NotFound`] when no directory row exists and
    /// [`CacheError::NotEmpty`] when any non-deleted record sits strictly
    /// under the path. On success the row is removed outright — directories
    /// are never tombstoned.
    pub fn rmdir_if_empty(&self, dir: &str) -> CacheResult<()> {
        let dir = paths::clean(dir)?;
        let _guard = self.mutation_guard();

        match self.store.get(&dir)? {
            Some(rec) if rec.is_dir => {}
            _ => return Err(CacheError::NotFound { path: dir }),
        }
        if self.store.count_live_under(&dir)? > 0 {
            return Err(CacheError::NotEmpty { path: dir });
        }
        self.store.delete_dir_row(&dir)?;

        // The content directory may be absent, or may still hold tombstone
        // markers that must keep signaling; neither blocks the removal.
        match fs::remove_dir(paths::content_path(&self.root, &dir)) {
            Ok(()) => {}
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::DirectoryNotEmpty) => {
                debug!("content directory for {dir} left in place: {e}");
            }
            Err(e) => return Err(e.into()),
        }
        info!("rmdir {dir}");
        Ok(())
    }

    /// Metadata-only timestamp update, independent of any content change.
    pub fn set_mod_time(&self, path: &str, mod_time: DateTime<Utc>) -> CacheResult<()> {
        let path = paths::clean(path)?;
        let _guard = self.mutation_guard();
        if self.store.set_mod_time(&path, mod_time)? {
            debug!("set mod time of {path} to {mod_time}");
            Ok(())
        } else {
            Err(CacheError::NotFound { path })
        }
    }

    /// Open the content file of a live record for reading.
    ///
    /// Tombstoned and directory paths are [`CacheError::NotFound`]. A live
    /// record whose content was already consumed by the local process
    /// surfaces the underlying I/O error verbatim.
    pub fn open_content(&self, path: &str) -> CacheResult<File> {
        let rec = self.lookup(path)?;
        Ok(File::open(paths::content_path(&self.root, &rec.path))?)
    }

    pub(crate) fn store(&self) -> &MetaStore {
        &self.store
    }
}
