use crate::oracle::{OracleBackend, OracleError, OracleFeatures};
use crate::registry::UrlRecord;
use crate::url::canonicalize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Ground-truth lookup from canonical URL to quality score
///
/// Used for oracle experiments where the true quality of every corpus document
/// is known ahead of the crawl. Scores outside `[0, 1]` are min-max rescaled at
/// load time so their relative order survives the adapter's clamping.
#[derive(Debug, Clone, Default)]
pub struct TableBackend {
    scores: HashMap<String, f64>,
}

impl TableBackend {
    /// Builds a table from `(raw url, score)` pairs
    ///
    /// URLs that fail to canonicalize and non-finite scores are dropped.
    pub fn from_scores<I, S>(scores: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut table = HashMap::new();
        let mut dropped = 0usize;

        for (raw, score) in scores {
            match canonicalize(raw.as_ref()) {
                Ok(url) if score.is_finite() => {
                    table.insert(url.as_str().to_string(), score);
                }
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!("Dropped {} unusable score entries", dropped);
        }

        rescale(&mut table);
        Self { scores: table }
    }

    /// Loads a `url<TAB>score` file; blank lines and `#` comments are ignored
    pub fn from_tsv(path: &Path) -> Result<Self, OracleError> {
        let load_err = |message: String| OracleError::Load {
            path: path.display().to_string(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let mut pairs = Vec::new();

        for (n, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (url, score) = line
                .split_once('\t')
                .ok_or_else(|| load_err(format!("line {}: expected url<TAB>score", n + 1)))?;
            let score: f64 = score
                .trim()
                .parse()
                .map_err(|e| load_err(format!("line {}: bad score '{}': {}", n + 1, score, e)))?;
            pairs.push((url.to_string(), score));
        }

        let backend = Self::from_scores(pairs);
        info!(
            "Loaded {} quality scores from {}",
            backend.len(),
            path.display()
        );
        Ok(backend)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<f64> {
        self.scores.get(url).copied()
    }
}

/// Min-max rescales scores into `[0, 1]` when any value falls outside it
fn rescale(scores: &mut HashMap<String, f64>) {
    let (min, max) = scores
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if scores.is_empty() || (min >= 0.0 && max <= 1.0) {
        return;
    }

    let span = max - min;
    for value in scores.values_mut() {
        *value = if span > 0.0 { (*value - min) / span } else { 0.5 };
    }
}

impl OracleBackend for TableBackend {
    fn name(&self) -> &str {
        "table"
    }

    fn score(&self, record: &UrlRecord, _features: &OracleFeatures<'_>) -> Result<f64, OracleError> {
        self.get(record.url.as_str())
            .ok_or_else(|| OracleError::Missing(record.url.to_string()))
    }
}
