//! ghostfs - Metadata-Indexed Content Cache
//!
//! A cache that sits between a remote data source and a local consumer,
//! remembering everything needed to answer "has this changed since last
//! seen?" independently of whether the file bytes still exist locally.
//! Deletions are signaled with tombstones: a flagged metadata row plus a
//! zero-byte `.delete` marker file the consumer can watch for.

pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod fs;
pub mod logging;
pub mod paths;
pub mod store;

pub use digest::{Digest, DigestKind, SUPPORTED_DIGEST};
pub use error::{CacheError, CacheResult};
pub use fs::{Candidate, GhostFs, Outcome, Reconciled};
pub use store::{Entry, FileRecord};
