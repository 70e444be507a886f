//! Configuration module for qcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use qcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler page budget: {}", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BenchmarkEntry, Config, ConfigOverrides, CrawlerConfig, ExperimentConfig, FetcherConfig,
    FetcherKind, FrontierType, OracleBackendKind, OracleConfig, SeedStrategy, SeedsConfig,
    SnapshotConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    apply_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};

pub use validation::is_path_safe_name;
