//! Fetcher interface
//!
//! Given a canonical URL, a fetcher returns the page content and its outlinks
//! in document order. Retries and network timeouts are the fetcher's own
//! business; the scheduler records any error as a failed fetch without looking
//! further.

use crate::url::CanonicalUrl;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// A link found on a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outlink {
    /// Absolute URL as found, before canonicalization
    pub url: String,
    /// Anchor text, whitespace-collapsed
    pub anchor: Option<String>,
}

impl Outlink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anchor: None,
        }
    }

    pub fn with_anchor(url: impl Into<String>, anchor: impl Into<String>) -> Self {
        let anchor = anchor.into();
        Self {
            url: url.into(),
            anchor: if anchor.is_empty() { None } else { Some(anchor) },
        }
    }
}

/// Result of a successful fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub content: String,
    /// Outlinks in extraction order; this order drives DFS/BFS expansion
    pub outlinks: Vec<Outlink>,
    pub http_status: u16,
    /// Corpus document identifier, when known
    pub docno: Option<String>,
    pub title: Option<String>,
}

/// Why a fetch did not produce a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("URL not in corpus: {0}")]
    NotInCorpus(String),

    #[error("Expected HTML, got {0}")]
    ContentMismatch(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// HTTP status associated with the failure, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status } => Some(*status),
            _ => None,
        }
    }
}

/// Source of page content
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &CanonicalUrl) -> Result<FetchedPage, FetchError>;

    /// Whether `url` can be fetched at all
    ///
    /// A simulated crawl over a fixed corpus answers false for URLs outside the
    /// corpus so the scheduler never registers them.
    fn is_fetchable(&self, _url: &CanonicalUrl) -> bool {
        true
    }
}
