//! SQLite-backed metadata store.
//!
//! One `files` table keyed by logical path, living alongside the content tree
//! under the storage root. The connection sits behind a process-wide mutex:
//! every logical operation runs in one exclusive region, and multi-row
//! operations (ancestor materialization) run inside a single transaction.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{CacheError, CacheResult};

use super::record::FileRecord;

/// File name of the metadata database inside the storage root.
pub const DB_FILE_NAME: &str = "ghostfs.db";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS files (
    path     TEXT PRIMARY KEY,
    size     INTEGER NOT NULL DEFAULT 0,
    mod_time TEXT NOT NULL,
    has_hash INTEGER NOT NULL DEFAULT 0,
    hash     TEXT NOT NULL DEFAULT '',
    deleted  INTEGER NOT NULL DEFAULT 0,
    is_dir   INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_files_deleted ON files(deleted);
";

const RECORD_COLUMNS: &str = "path, size, mod_time, has_hash, hash, deleted, is_dir";

/// Durable key-value table of [`FileRecord`] rows.
pub struct MetaStore {
    conn: Mutex<Connection>,
}

impl MetaStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        debug!("metadata store opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another thread panicked mid-query; the
        // connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert-or-replace a record by path. No validation beyond field types;
    /// callers pre-compute consistent flags.
    pub fn upsert(&self, record: &FileRecord) -> CacheResult<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO files (path, size, mod_time, has_hash, hash, deleted, is_dir)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.path,
                record.size as i64,
                fmt_time(record.mod_time),
                record.has_hash,
                record.hash,
                record.deleted,
                record.is_dir,
            ],
        )?;
        Ok(())
    }

    /// Fetch the record for an exact path, tombstoned and directory rows
    /// included.
    pub fn get(&self, path: &str) -> CacheResult<Option<FileRecord>> {
        let conn = self.conn();
        let record = conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM files WHERE path = ?1"),
                [path],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// All non-deleted rows under `prefix`, ordered by path.
    ///
    /// An empty prefix selects top-level rows (no separator in the path);
    /// otherwise every descendant of `prefix` is returned and the caller
    /// narrows to one level.
    pub fn list_prefix(&self, prefix: &str) -> CacheResult<Vec<FileRecord>> {
        let conn = self.conn();
        let mut records = Vec::new();

        if prefix.is_empty() {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM files
                 WHERE path NOT LIKE '%/%' AND deleted = 0 ORDER BY path"
            ))?;
            let rows = stmt.query_map([], row_to_record)?;
            for row in rows {
                records.push(row?);
            }
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM files
                 WHERE path LIKE ?1 ESCAPE '\\' AND deleted = 0 ORDER BY path"
            ))?;
            let pattern = format!("{}/%", like_escape(prefix));
            let rows = stmt.query_map([pattern], row_to_record)?;
            for row in rows {
                records.push(row?);
            }
        }

        Ok(records)
    }

    /// Number of non-deleted rows strictly under `dir`.
    pub fn count_live_under(&self, dir: &str) -> CacheResult<u64> {
        let pattern = format!("{}/%", like_escape(dir));
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM files WHERE path LIKE ?1 ESCAPE '\\' AND deleted = 0",
            [pattern],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// Hard row removal, restricted to directory rows. Returns whether a row
    /// was deleted.
    pub fn delete_dir_row(&self, path: &str) -> CacheResult<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM files WHERE path = ?1 AND is_dir = 1", [path])?;
        Ok(affected > 0)
    }

    /// Modtime-only partial update. Returns whether a row was touched.
    pub fn set_mod_time(&self, path: &str, mod_time: DateTime<Utc>) -> CacheResult<bool> {
        let affected = self.conn().execute(
            "UPDATE files SET mod_time = ?1 WHERE path = ?2",
            params![fmt_time(mod_time), path],
        )?;
        Ok(affected > 0)
    }

    /// Deleted-flag partial update; size and hash stay as last known.
    /// Directory rows are never tombstoned, so they are excluded at the SQL
    /// level. Returns whether a row was touched.
    pub fn set_deleted(&self, path: &str, mod_time: DateTime<Utc>) -> CacheResult<bool> {
        let affected = self.conn().execute(
            "UPDATE files SET deleted = 1, mod_time = ?1 WHERE path = ?2 AND is_dir = 0",
            params![fmt_time(mod_time), path],
        )?;
        Ok(affected > 0)
    }

    /// Ensure a directory row exists for every path in `dirs`, shallow to
    /// deep, inside one transaction.
    ///
    /// Existing directory rows are left untouched. A live file row at one of
    /// the paths aborts the whole unit with [`CacheError::NotADirectory`]; a
    /// tombstoned file row is replaced by a directory row (the path was
    /// deleted remotely and has reappeared as a directory).
    pub fn materialize_dirs<'a, I>(&self, dirs: I) -> CacheResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = fmt_time(Utc::now());

        for dir in dirs {
            let existing: Option<(bool, bool)> = tx
                .query_row(
                    "SELECT is_dir, deleted FROM files WHERE path = ?1",
                    [dir],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            match existing {
                Some((true, _)) => {}
                Some((false, false)) => {
                    // Dropping the transaction rolls back rows inserted so far.
                    return Err(CacheError::NotADirectory {
                        path: dir.to_string(),
                    });
                }
                Some((false, true)) | None => {
                    tx.execute(
                        "INSERT OR REPLACE INTO files
                             (path, size, mod_time, has_hash, hash, deleted, is_dir)
                         VALUES (?1, 0, ?2, 0, '', 0, 1)",
                        params![dir, now],
                    )?;
                    debug!("materialized directory record {dir}");
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}

fn fmt_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    let mod_time: String = row.get(2)?;
    let mod_time = DateTime::parse_from_rfc3339(&mod_time)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);
    let size: i64 = row.get(1)?;
    Ok(FileRecord {
        path: row.get(0)?,
        size: size.max(0) as u64,
        mod_time,
        has_hash: row.get(3)?,
        hash: row.get(4)?,
        deleted: row.get(5)?,
        is_dir: row.get(6)?,
    })
}

/// Escape SQL LIKE metacharacters so stored paths match literally.
fn like_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
