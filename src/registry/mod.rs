//! URL registry: canonical identity, deduplication and fetch status
//!
//! The registry is the only place URL records are created. Frontier entries
//! refer to records by discovery sequence, so two entries can never point at
//! different records for the same canonical URL.

mod record;
mod status;
mod url_registry;

use thiserror::Error;

pub use record::{FetchOutcome, Seq, UrlRecord};
pub use status::FetchStatus;
pub use url_registry::{StatusCounts, UrlRegistry};

/// Registry invariant violations
///
/// These indicate a scheduler bug (double processing) and abort the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Invalid status transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: FetchStatus,
        to: FetchStatus,
    },

    #[error("URL not registered: {0}")]
    NotFound(String),
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
