//! Snapshot persistence
//!
//! A snapshot is an immutable, labeled materialization of every fetched URL
//! record at a page-count checkpoint. Each one lives in its own directory:
//!
//! ```text
//! <root>/<exp_name>/<label>/
//!     manifest.toml
//!     snapshot.db      (documents table, one row per fetched record, fetch order)
//! ```
//!
//! Snapshots are written once and never touched again; the downstream indexer
//! reads them without a live crawl process.

mod checkpoint;
mod content;
mod index_plan;
mod manifest;
mod reader;
mod schema;
mod writer;

pub use checkpoint::CheckpointPlan;
pub use content::ContentStore;
pub use index_plan::{
    plan_index, write_index_plan, IndexPlan, IndexRequest, PlannedBenchmark, PlannedSnapshot,
    ALL_BENCHMARKS,
};
pub use manifest::SnapshotManifest;
pub use reader::{list_snapshots, Snapshot, SnapshotDocument};
pub use writer::SqliteSnapshotWriter;

use crate::config::FrontierType;
use crate::registry::UrlRecord;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const MANIFEST_FILE: &str = "manifest.toml";
pub const DATABASE_FILE: &str = "snapshot.db";
pub const CONTENT_DATABASE_FILE: &str = "content.db";
pub const DOCNOS_FILE: &str = "docnos.txt";

/// Snapshot-specific errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Snapshot '{0}' already exists")]
    AlreadyExists(String),

    #[error("Snapshot not found: {0}")]
    NotFound(String),

    #[error("Failed to write manifest: {0}")]
    ManifestWrite(#[from] toml::ser::Error),

    #[error("Failed to read manifest: {0}")]
    ManifestRead(#[from] toml::de::Error),

    #[error("Invalid snapshot label: {0}")]
    InvalidLabel(String),

    #[error("Invalid index request: {0}")]
    InvalidRequest(String),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Checkpoint label of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SnapshotLabel {
    /// Written when the fetched count reached the given page count
    Limit(u64),
    /// Written when the crawl terminated
    Final,
}

impl SnapshotLabel {
    /// The page-count limit, or `None` for the final snapshot
    pub fn limit(&self) -> Option<u64> {
        match self {
            SnapshotLabel::Limit(n) => Some(*n),
            SnapshotLabel::Final => None,
        }
    }
}

impl fmt::Display for SnapshotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotLabel::Limit(n) => write!(f, "limit_{}", n),
            SnapshotLabel::Final => write!(f, "final"),
        }
    }
}

impl FromStr for SnapshotLabel {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "final" {
            return Ok(SnapshotLabel::Final);
        }
        s.strip_prefix("limit_")
            .and_then(|n| n.parse::<u64>().ok())
            .map(SnapshotLabel::Limit)
            .ok_or_else(|| SnapshotError::InvalidLabel(s.to_string()))
    }
}

/// Everything a writer needs to materialize one snapshot
#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    pub label: SnapshotLabel,
    pub exp_name: String,
    pub frontier_type: FrontierType,
    pub config_hash: Option<String>,
    /// Fetched records in fetch order
    pub records: Vec<UrlRecord>,
}

/// A written snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHandle {
    pub label: SnapshotLabel,
    pub dir: PathBuf,
    pub page_count: usize,
}

/// Persists snapshots
///
/// Called from a blocking thread; implementations may do synchronous IO.
pub trait SnapshotWriter: Send + Sync {
    fn write(&self, request: SnapshotRequest) -> SnapshotResult<SnapshotHandle>;
}
