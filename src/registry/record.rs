use crate::registry::FetchStatus;
use crate::url::CanonicalUrl;

/// Discovery sequence number; also the record's index in the registry
pub type Seq = u64;

/// Everything the crawl knows about one canonical URL
#[derive(Debug, Clone, PartialEq)]
pub struct UrlRecord {
    /// Discovery order, starting at 0
    pub seq: Seq,
    pub url: CanonicalUrl,
    /// First page that linked here; `None` for seeds
    pub parent: Option<CanonicalUrl>,
    /// Link distance from the seed set
    pub depth: u32,
    pub status: FetchStatus,
    /// Hex SHA-256 of the fetched content
    pub content_hash: Option<String>,
    pub outlink_count: u32,
    /// Number of discoveries of this URL from a parent page
    pub inlink_count: u32,
    /// Only populated under the quality-oracle frontier
    pub oracle_score: Option<f64>,
    pub http_status: Option<u16>,
    /// Corpus document identifier, when the fetcher has one
    pub docno: Option<String>,
    pub error: Option<String>,
}

impl UrlRecord {
    pub(crate) fn new(seq: Seq, url: CanonicalUrl, parent: Option<CanonicalUrl>, depth: u32) -> Self {
        let inlink_count = u32::from(parent.is_some());
        Self {
            seq,
            url,
            parent,
            depth,
            status: FetchStatus::Pending,
            content_hash: None,
            outlink_count: 0,
            inlink_count,
            oracle_score: None,
            http_status: None,
            docno: None,
            error: None,
        }
    }

    pub fn host(&self) -> &str {
        self.url.host()
    }

    pub fn is_seed(&self) -> bool {
        self.parent.is_none()
    }
}

/// Result of processing a dispatched URL, applied by `UrlRegistry::mark_fetched`
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub status: FetchStatus,
    pub content_hash: Option<String>,
    pub outlink_count: u32,
    pub http_status: Option<u16>,
    pub docno: Option<String>,
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn fetched(
        content_hash: String,
        outlink_count: u32,
        http_status: u16,
        docno: Option<String>,
    ) -> Self {
        Self {
            status: FetchStatus::Fetched,
            content_hash: Some(content_hash),
            outlink_count,
            http_status: Some(http_status),
            docno,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, http_status: Option<u16>) -> Self {
        Self {
            status: FetchStatus::Failed,
            content_hash: None,
            outlink_count: 0,
            http_status,
            docno: None,
            error: Some(error.into()),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: FetchStatus::Skipped,
            content_hash: None,
            outlink_count: 0,
            http_status: None,
            docno: None,
            error: Some(reason.into()),
        }
    }
}
