//! Quality oracle adapter
//!
//! A [`QualityOracle`] wraps a pluggable [`OracleBackend`] and turns whatever it
//! returns into a score in `[0, 1]`. Backend failures never propagate: the
//! adapter logs them and substitutes the configured default score, so a degraded
//! backend can slow down prioritization but never stall the crawl.
//!
//! Only the quality-oracle frontier consults the oracle.

mod heuristic;
mod table;

use crate::registry::UrlRecord;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

pub use heuristic::HeuristicBackend;
pub use table::TableBackend;

/// Errors reported by oracle backends
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("No score available for {0}")]
    Missing(String),

    #[error("Oracle backend error: {0}")]
    Backend(String),

    #[error("Failed to load scores from {path}: {message}")]
    Load { path: String, message: String },
}

/// Observable context available when a URL is scored
///
/// Scoring happens once, when the URL is first discovered, so the features
/// describe the discovering link rather than the target page.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleFeatures<'a> {
    /// Anchor text of the discovering link
    pub anchor_text: Option<&'a str>,
    /// Title of the page the link was found on
    pub parent_title: Option<&'a str>,
    /// Oracle score of the page the link was found on
    pub parent_score: Option<f64>,
    /// Incoming edges of the page the link was found on, counted when it was fetched
    pub parent_inlinks: Option<u32>,
}

/// A scoring function over URL records
///
/// Implementations must be deterministic: the same record and features always
/// produce the same value.
pub trait OracleBackend: Send + Sync {
    /// Short name used in logs and snapshot manifests
    fn name(&self) -> &str;

    fn score(&self, record: &UrlRecord, features: &OracleFeatures<'_>) -> Result<f64, OracleError>;
}

/// Result of an adapter call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleScore {
    pub value: f64,
    /// True when the backend failed and the default was used
    pub fell_back: bool,
}

/// Fail-soft adapter around an [`OracleBackend`]
#[derive(Clone)]
pub struct QualityOracle {
    backend: Arc<dyn OracleBackend>,
    default_score: f64,
    seed_score: f64,
}

impl std::fmt::Debug for QualityOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityOracle")
            .field("backend", &self.backend.name())
            .field("default_score", &self.default_score)
            .field("seed_score", &self.seed_score)
            .finish()
    }
}

impl QualityOracle {
    pub fn new(backend: Arc<dyn OracleBackend>, default_score: f64) -> Self {
        Self {
            backend,
            default_score: default_score.clamp(0.0, 1.0),
            seed_score: 1.0,
        }
    }

    /// Sets the score given to seeds
    pub fn with_seed_score(mut self, seed_score: f64) -> Self {
        self.seed_score = seed_score.clamp(0.0, 1.0);
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn default_score(&self) -> f64 {
        self.default_score
    }

    /// Seeds are not scored; they all get the seed score so they dequeue first
    pub fn seed_score(&self) -> f64 {
        self.seed_score
    }

    /// Scores a record, falling back to the default on any backend failure
    ///
    /// Out-of-range values are clamped into `[0, 1]`; NaN and infinities count
    /// as failures.
    pub fn score(&self, record: &UrlRecord, features: &OracleFeatures<'_>) -> OracleScore {
        match self.backend.score(record, features) {
            Ok(value) if value.is_finite() => OracleScore {
                value: value.clamp(0.0, 1.0),
                fell_back: false,
            },
            Ok(value) => {
                warn!(
                    "Oracle '{}' returned non-finite score {} for {}, using default {}",
                    self.backend.name(),
                    value,
                    record.url,
                    self.default_score
                );
                self.fallback()
            }
            Err(e) => {
                warn!(
                    "Oracle '{}' failed for {}: {}, using default {}",
                    self.backend.name(),
                    record.url,
                    e,
                    self.default_score
                );
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> OracleScore {
        OracleScore {
            value: self.default_score,
            fell_back: true,
        }
    }
}
