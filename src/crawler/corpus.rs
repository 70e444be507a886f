//! Simulated crawl over a fixed JSON-lines corpus
//!
//! Each line is one document:
//!
//! ```json
//! {"url": "http://a.example/", "docno": "doc-1", "content": "...",
//!  "outlinks": ["http://b.example/", ["http://c.example/", "anchor"]],
//!  "quality": 0.73, "title": "A"}
//! ```
//!
//! Only `url` is required. Fetching a URL returns the stored document; URLs
//! outside the corpus are not fetchable.

use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher, Outlink};
use crate::url::{canonicalize, CanonicalUrl};
use crate::{CrawlError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct CorpusLine {
    url: String,
    #[serde(default)]
    docno: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    outlinks: Vec<RawOutlink>,
    #[serde(default)]
    quality: Option<f64>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOutlink {
    Url(String),
    WithAnchor(String, String),
}

impl From<RawOutlink> for Outlink {
    fn from(raw: RawOutlink) -> Self {
        match raw {
            RawOutlink::Url(url) => Outlink::new(url),
            RawOutlink::WithAnchor(url, anchor) => Outlink::with_anchor(url, anchor),
        }
    }
}

/// One corpus document
#[derive(Debug, Clone)]
pub struct CorpusDocument {
    pub url: CanonicalUrl,
    pub docno: String,
    pub content: String,
    pub outlinks: Vec<Outlink>,
    pub quality: Option<f64>,
    pub title: Option<String>,
}

impl CorpusDocument {
    pub fn new(url: CanonicalUrl, docno: impl Into<String>, outlinks: Vec<Outlink>) -> Self {
        Self {
            url,
            docno: docno.into(),
            content: String::new(),
            outlinks,
            quality: None,
            title: None,
        }
    }
}

/// Removes self-links and repeated targets, keeping first occurrences in order
///
/// Links that fail to canonicalize are kept so the scheduler can count them.
fn clean_outlinks(url: &CanonicalUrl, outlinks: Vec<Outlink>) -> Vec<Outlink> {
    let mut seen = HashSet::new();
    outlinks
        .into_iter()
        .filter(|link| match canonicalize(&link.url) {
            Ok(target) => &target != url && seen.insert(target.as_str().to_string()),
            Err(_) => seen.insert(link.url.clone()),
        })
        .collect()
}

/// In-memory corpus, indexed by canonical URL
#[derive(Debug, Default)]
pub struct CorpusFetcher {
    documents: Vec<CorpusDocument>,
    index: HashMap<String, usize>,
}

impl CorpusFetcher {
    /// Loads a JSON-lines corpus file
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let corpus = Self::from_reader(std::io::BufReader::new(file), &path.display().to_string())?;
        info!(
            "Loaded corpus of {} documents from {}",
            corpus.len(),
            path.display()
        );
        Ok(corpus)
    }

    /// Reads a JSON-lines corpus; `source` names it in errors
    ///
    /// Blank lines are ignored. A line whose URL does not canonicalize, or that
    /// repeats an earlier URL, is skipped with a warning.
    pub fn from_reader<R: BufRead>(reader: R, source: &str) -> Result<Self> {
        let mut documents = Vec::new();

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let parsed: CorpusLine =
                serde_json::from_str(&line).map_err(|e| CrawlError::Corpus {
                    path: source.to_string(),
                    line: n + 1,
                    message: e.to_string(),
                })?;

            let url = match canonicalize(&parsed.url) {
                Ok(url) => url,
                Err(e) => {
                    warn!("{}:{}: skipping document {}: {}", source, n + 1, parsed.url, e);
                    continue;
                }
            };

            documents.push(CorpusDocument {
                outlinks: parsed.outlinks.into_iter().map(Outlink::from).collect(),
                docno: parsed.docno.unwrap_or_else(|| url.to_string()),
                content: parsed.content,
                quality: parsed.quality,
                title: parsed.title,
                url,
            });
        }

        Ok(Self::from_documents(documents))
    }

    /// Builds a corpus from documents; later duplicates of a URL are dropped
    pub fn from_documents(documents: Vec<CorpusDocument>) -> Self {
        let mut corpus = Self::default();

        for mut doc in documents {
            if corpus.index.contains_key(doc.url.as_str()) {
                warn!("Duplicate corpus URL {}, keeping the first", doc.url);
                continue;
            }
            doc.outlinks = clean_outlinks(&doc.url, std::mem::take(&mut doc.outlinks));
            corpus
                .index
                .insert(doc.url.as_str().to_string(), corpus.documents.len());
            corpus.documents.push(doc);
        }

        corpus
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, url: &CanonicalUrl) -> Option<&CorpusDocument> {
        self.index.get(url.as_str()).map(|&i| &self.documents[i])
    }

    pub fn contains(&self, url: &CanonicalUrl) -> bool {
        self.index.contains_key(url.as_str())
    }

    /// Documents in file order
    pub fn documents(&self) -> &[CorpusDocument] {
        &self.documents
    }

    /// `(url, quality)` for every document that has a quality value
    pub fn quality_scores(&self) -> impl Iterator<Item = (&str, f64)> {
        self.documents
            .iter()
            .filter_map(|d| d.quality.map(|q| (d.url.as_str(), q)))
    }
}

#[async_trait]
impl Fetcher for CorpusFetcher {
    async fn fetch(&self, url: &CanonicalUrl) -> std::result::Result<FetchedPage, FetchError> {
        let doc = self
            .get(url)
            .ok_or_else(|| FetchError::NotInCorpus(url.to_string()))?;

        Ok(FetchedPage {
            content: doc.content.clone(),
            outlinks: doc.outlinks.clone(),
            http_status: 200,
            docno: Some(doc.docno.clone()),
            title: doc.title.clone(),
        })
    }

    fn is_fetchable(&self, url: &CanonicalUrl) -> bool {
        self.contains(url)
    }
}
