//! Command-line interface definitions for ghostfs.
//!
//! All arguments and subcommands use the clap derive API, with global options
//! (verbosity, storage root, JSON output) and one subcommand per façade
//! operation of the cache.
//!
//! # Example
//!
//! ```bash
//! # Ingest a local file under a logical path
//! ghostfs put ./report.pdf docs/report.pdf
//!
//! # One-level listing, JSON for scripting
//! ghostfs ls docs --json
//!
//! # Signal a remote-side deletion (tombstone + marker file)
//! ghostfs rm docs/report.pdf
//! ```

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Metadata-indexed content cache with tombstone-based deletion signaling.
///
/// ghostfs remembers the size, modification time, and digest of every file it
/// has ingested, even after the content itself is gone, so that re-running a
/// sync transfers only what actually changed.
#[derive(Debug, Parser)]
#[command(name = "ghostfs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Storage root holding the metadata database and the content tree
    #[arg(long, global = true, env = "GHOSTFS_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Emit machine-readable JSON instead of plain text
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for ghostfs.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List one level of entries under a directory
    Ls(LsArgs),
    /// Show the stored record for a path
    Stat(StatArgs),
    /// Ingest a local file under a logical path (skip if unchanged)
    Put(PutArgs),
    /// Mark a path as deleted remotely
    Rm(PathArg),
    /// Materialize a directory
    Mkdir(PathArg),
    /// Remove a directory if nothing live remains under it
    Rmdir(PathArg),
    /// Update a record's modification time without touching content
    Touch(TouchArgs),
    /// Stream a path's cached content to stdout
    Cat(PathArg),
}

/// Arguments for the ls subcommand.
#[derive(Debug, Args)]
pub struct LsArgs {
    /// Directory to list; omit for the top level
    #[arg(value_name = "DIR", default_value = "")]
    pub dir: String,
}

/// Arguments for the stat subcommand.
#[derive(Debug, Args)]
pub struct StatArgs {
    /// Logical path to look up
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Include tombstoned and directory rows instead of reporting not-found
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for the put subcommand.
#[derive(Debug, Args)]
pub struct PutArgs {
    /// Local file to read content from
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Logical path to store it under
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Modification time to record (RFC 3339); defaults to the source
    /// file's mtime
    #[arg(long, value_name = "TIME")]
    pub mod_time: Option<DateTime<Utc>>,
}

/// Arguments for the touch subcommand.
#[derive(Debug, Args)]
pub struct TouchArgs {
    /// Logical path to update
    #[arg(value_name = "PATH")]
    pub path: String,

    /// New modification time (RFC 3339); defaults to now
    #[arg(long, value_name = "TIME")]
    pub time: Option<DateTime<Utc>>,
}

/// A single logical-path argument, shared by several subcommands.
#[derive(Debug, Args)]
pub struct PathArg {
    /// Logical path to operate on
    #[arg(value_name = "PATH")]
    pub path: String,
}
