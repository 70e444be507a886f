//! qcrawl: a budgeted crawl frontier and scheduling engine
//!
//! This crate crawls a web corpus under a fixed page budget using one of several
//! interchangeable frontier strategies (BFS, DFS, quality-oracle, random), and
//! materializes snapshots of the fetched documents at page-count checkpoints so
//! they can be indexed and evaluated downstream.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod oracle;
pub mod output;
pub mod registry;
pub mod snapshot;
pub mod url;

use thiserror::Error;

/// Main error type for qcrawl operations
///
/// Only configuration errors and registry invariant violations reach the caller
/// of a crawl; per-URL failures are recorded on the URL record instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Registry invariant violated: {0}")]
    Registry(#[from] registry::RegistryError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] oracle::OracleError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] snapshot::SnapshotError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corpus error at {path}:{line}: {message}")]
    Corpus {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Scheduler cannot run from phase {0}")]
    InvalidPhase(crawler::CrawlPhase),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown frontier type '{0}' (expected bfs, dfs, oracle-quality or random)")]
    UnknownFrontierType(String),
}

/// URL-specific errors
///
/// Any of these means the URL is malformed: callers skip it and keep crawling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for qcrawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, FrontierType};
pub use crawler::{CrawlPhase, CrawlReport, Scheduler};
pub use frontier::{DispatchKey, Frontier, FrontierEntry};
pub use registry::{FetchStatus, UrlRecord, UrlRegistry};
pub use url::{canonicalize, CanonicalUrl};
