//! Logical path handling.
//!
//! Records are keyed by forward-slash-separated paths relative to the storage
//! root. The same visual filename can arrive in NFC or NFD Unicode form
//! depending on the source platform (macOS decomposes, Linux and Windows
//! usually do not), so every logical path is normalized to NFC before it is
//! compared or stored. Validation rejects anything that could escape the
//! content tree.

use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

use crate::error::{CacheError, CacheResult};

/// Suffix appended to a path to form its tombstone marker file name.
pub const TOMBSTONE_SUFFIX: &str = ".delete";

/// Validate and normalize a logical path.
///
/// Returns the NFC-normalized path. Rejected: empty paths, absolute paths,
/// backslashes, trailing slashes, and `.`/`..`/empty segments.
pub fn clean(path: &str) -> CacheResult<String> {
    let invalid = |reason| CacheError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if path.starts_with('/') {
        return Err(invalid("absolute paths are not allowed"));
    }
    if path.contains('\\') {
        return Err(invalid("backslash separators are not allowed"));
    }
    if path.ends_with('/') {
        return Err(invalid("trailing slash"));
    }
    for segment in path.split('/') {
        match segment {
            "" => return Err(invalid("empty path segment")),
            "." | ".." => return Err(invalid("relative path segment")),
            _ => {}
        }
    }

    Ok(path.nfc().collect())
}

/// Like [`clean`], but accepts the empty string as the root directory scope.
pub fn clean_dir(dir: &str) -> CacheResult<String> {
    if dir.is_empty() {
        Ok(String::new())
    } else {
        clean(dir)
    }
}

/// The immediate parent of a logical path; `""` for top-level paths.
#[must_use]
pub fn parent(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}

/// Proper ancestors of a path, shallow to deep.
///
/// `ancestors("a/b/c")` yields `"a"`, then `"a/b"`.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.char_indices()
        .filter(|&(_, c)| c == '/')
        .map(move |(i, _)| &path[..i])
}

/// Absolute location of a logical path's content file under `root`.
#[must_use]
pub fn content_path(root: &Path, path: &str) -> PathBuf {
    root.join(path)
}

/// Absolute location of a logical path's tombstone marker under `root`.
#[must_use]
pub fn marker_path(root: &Path, path: &str) -> PathBuf {
    root.join(format!("{path}{TOMBSTONE_SUFFIX}"))
}
