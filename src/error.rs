//! Error types for the ghostfs library.
//!
//! The library reports failures through [`CacheError`]; the CLI binary wraps
//! them in `anyhow` at the application boundary. There are no internal
//! retries: every failure is surfaced to the caller synchronously, and
//! multi-step operations write metadata last so the store never references
//! content that was not fully written.

use thiserror::Error;

use crate::digest::DigestKind;

/// Result alias used throughout the library.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors produced by store, reconciliation, and façade operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Lookup miss, or a directory-removal target that has no row.
    #[error("no such entry: {path}")]
    NotFound { path: String },

    /// Directory removal refused because live records exist under it.
    #[error("directory not empty: {path}")]
    NotEmpty { path: String },

    /// An ancestor segment of a path exists as a live file record.
    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    /// A file operation targeted a path whose record is a directory.
    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    /// A digest was requested in an algorithm the store does not support.
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedDigest(DigestKind),

    /// A logical path failed validation before touching storage.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// Content filesystem failure, surfaced verbatim.
    #[error("content I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata store failure; fatal to the in-flight operation.
    #[error("metadata store failure: {0}")]
    Store(#[from] rusqlite::Error),
}

impl CacheError {
    /// True when the error is a lookup miss rather than a hard failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
