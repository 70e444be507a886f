//! Seed selection

use crate::config::{SeedStrategy, SeedsConfig};
use crate::crawler::corpus::CorpusFetcher;
use crate::url::CanonicalUrl;
use crate::{ConfigError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::Path;

/// Reads one URL per line, skipping blank lines and `#` comments
pub fn read_seed_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// `seeds.urls` followed by the lines of `seeds.file`, in order
pub fn list_seeds(config: &SeedsConfig) -> Result<Vec<String>> {
    let mut seeds = config.urls.clone();
    if let Some(ref file) = config.file {
        seeds.extend(read_seed_file(file)?);
    }
    Ok(seeds)
}

/// Samples `count` distinct corpus URLs with a seeded RNG
///
/// Sampling runs over the corpus in file order, so a fixed seed and corpus
/// always give the same seeds, in the same order.
pub fn sample_seeds(corpus: &CorpusFetcher, count: usize, random_seed: u64) -> Result<Vec<String>> {
    if count > corpus.len() {
        return Err(ConfigError::Validation(format!(
            "seeds.count = {} exceeds the corpus size {}",
            count,
            corpus.len()
        ))
        .into());
    }

    let mut rng = StdRng::seed_from_u64(random_seed);
    let documents = corpus.documents();
    Ok(rand::seq::index::sample(&mut rng, documents.len(), count)
        .into_iter()
        .map(|i| documents[i].url.to_string())
        .collect())
}

/// Resolves the raw seed list for a crawl
///
/// The random strategy needs the corpus; validation guarantees it is present.
pub fn resolve_seeds(
    config: &SeedsConfig,
    corpus: Option<&CorpusFetcher>,
    random_seed: u64,
) -> Result<Vec<String>> {
    match config.strategy {
        SeedStrategy::List => list_seeds(config),
        SeedStrategy::Random => {
            let corpus = corpus.ok_or_else(|| {
                ConfigError::Validation("random seeds require the corpus fetcher".to_string())
            })?;
            let count = config.count.ok_or_else(|| {
                ConfigError::Validation("random seeds require seeds.count".to_string())
            })?;
            sample_seeds(corpus, count, random_seed)
        }
    }
}

/// Writes the admitted seeds, one per line
pub fn write_seed_file(path: &Path, seeds: &[CanonicalUrl]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for seed in seeds {
        writeln!(file, "{}", seed)?;
    }
    file.flush()?;
    Ok(())
}
