//! Persistent record and listing entry definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::{self, DigestKind};
use crate::error::CacheResult;
use crate::paths::TOMBSTONE_SUFFIX;

/// The last-known state of one logical path.
///
/// A record's existence is independent of whether the corresponding content
/// file still exists on disk; that decoupling is what makes re-running a sync
/// against this store idempotent. Tombstoned records keep their historical
/// size and hash in storage but report size 0 to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Forward-slash logical path, relative to the storage root. Primary key.
    pub path: String,
    /// Byte count as stored; use [`FileRecord::reported_size`] for reads.
    pub size: u64,
    /// Last-known modification time, nanosecond precision.
    pub mod_time: DateTime<Utc>,
    /// Distinguishes "no digest computed" from an empty digest string.
    pub has_hash: bool,
    /// Hex BLAKE3 digest of the content, or `""` when `has_hash` is false.
    pub hash: String,
    /// Tombstone flag; set by remote-side deletion, cleared by resurrection.
    pub deleted: bool,
    /// True only for synthetic directory placeholder records.
    pub is_dir: bool,
}

impl FileRecord {
    /// True for a record a reader should see as a file: not deleted, not a
    /// directory placeholder.
    #[must_use]
    pub fn is_live_file(&self) -> bool {
        !self.deleted && !self.is_dir
    }

    /// Size as reported to readers: 0 for tombstoned records regardless of
    /// the stored historical value.
    #[must_use]
    pub fn reported_size(&self) -> u64 {
        if self.deleted {
            0
        } else {
            self.size
        }
    }

    /// Display name for the record; tombstoned paths carry the marker suffix.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.deleted {
            format!("{}{}", self.path, TOMBSTONE_SUFFIX)
        } else {
            self.path.clone()
        }
    }

    /// The stored digest in the requested algorithm.
    ///
    /// `Ok(None)` means no digest was ever computed for this record; an
    /// unsupported algorithm is an error.
    pub fn digest(&self, kind: DigestKind) -> CacheResult<Option<&str>> {
        digest::ensure_supported(kind)?;
        Ok(self.has_hash.then_some(self.hash.as_str()))
    }
}

/// One child entry in a directory listing.
#[derive(Debug, Clone, Serialize)]
pub enum Entry {
    File(FileRecord),
    Dir {
        path: String,
        mod_time: DateTime<Utc>,
    },
}

impl Entry {
    /// Logical path of the entry.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::File(rec) => &rec.path,
            Self::Dir { path, .. } => path,
        }
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Dir { .. })
    }
}
