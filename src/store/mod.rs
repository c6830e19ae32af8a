//! Metadata persistence for ghostfs.
//!
//! This module is split into two parts:
//!
//! * [`database`]: the SQLite-backed [`MetaStore`] with schema management,
//!   CRUD, prefix listing, and transactional directory materialization.
//! * [`record`]: the [`FileRecord`] row model and the [`Entry`] shapes that
//!   listings hand to callers.
//!
//! The store is the single shared mutable resource of the system. Records are
//! never purged automatically: a tombstoned row outlives both its content and
//! its deletion, which is what lets the next sync pass recognize paths it has
//! already seen.

pub mod database;
pub mod record;

pub use database::{MetaStore, DB_FILE_NAME};
pub use record::{Entry, FileRecord};
