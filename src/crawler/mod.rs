//! Crawler module: fetchers, seeds and the crawl scheduler
//!
//! This module contains the crawling side of the system:
//! - The [`Fetcher`] interface and its corpus and HTTP implementations
//! - HTML link extraction for the HTTP fetcher
//! - Seed selection
//! - The [`Scheduler`] that drives a crawl from seeds to its final snapshot

mod corpus;
mod fetcher;
mod http;
mod parser;
mod report;
mod scheduler;
mod seeds;
mod state;
mod stop;

pub use corpus::{CorpusDocument, CorpusFetcher};
pub use fetcher::{FetchError, FetchedPage, Fetcher, Outlink};
pub use http::{build_http_client, HttpFetcher};
pub use parser::{parse_html, ParsedPage};
pub use report::CrawlReport;
pub use scheduler::{hash_content, Scheduler, SchedulerSettings};
pub use seeds::{list_seeds, read_seed_file, resolve_seeds, sample_seeds, write_seed_file};
pub use state::{Budget, CrawlCounters, CrawlPhase, CrawlState, HostState};
pub use stop::{stop_on_ctrl_c, StopHandle};

use crate::config::{Config, FetcherKind, OracleBackendKind, OracleConfig};
use crate::oracle::{HeuristicBackend, OracleBackend, QualityOracle, TableBackend};
use crate::snapshot::{list_snapshots, ContentStore, SqliteSnapshotWriter, CONTENT_DATABASE_FILE};
use crate::{ConfigError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Admitted seeds are written here, under the experiment directory
pub const SEEDS_FILE: &str = "seeds.txt";

/// Runs a complete crawl described by `config`
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the fetcher (corpus or HTTP) and, for the oracle frontier, the oracle
/// 2. Resolve, admit and record the seeds
/// 3. Run the scheduler, writing checkpoint snapshots and the final snapshot
///
/// An experiment directory that already holds snapshots is refused so that
/// labeled snapshots are never mixed across runs.
pub async fn run_crawl(
    config: &Config,
    config_hash: Option<String>,
    stop: Option<StopHandle>,
) -> Result<CrawlReport> {
    let exp_dir = config.experiment_dir();
    if !list_snapshots(&exp_dir)?.is_empty() {
        return Err(ConfigError::Validation(format!(
            "experiment '{}' already has snapshots in {}",
            config.experiment.name,
            exp_dir.display()
        ))
        .into());
    }

    let corpus = match config.fetcher.kind {
        FetcherKind::Corpus => {
            let path = config.fetcher.corpus_path.as_ref().ok_or_else(|| {
                ConfigError::Validation("fetcher.corpus-path is required".to_string())
            })?;
            let corpus = CorpusFetcher::load(path)?;
            tracing::info!("Loaded {} corpus documents from {}", corpus.len(), path.display());
            Some(Arc::new(corpus))
        }
        FetcherKind::Http => None,
    };

    let fetcher: Arc<dyn Fetcher> = match corpus {
        Some(ref corpus) => corpus.clone(),
        None => {
            let user_agent = config.fetcher.user_agent.as_ref().ok_or_else(|| {
                ConfigError::Validation("fetcher.user-agent is required for http".to_string())
            })?;
            Arc::new(HttpFetcher::new(
                user_agent,
                Duration::from_millis(config.crawler.fetch_timeout_ms),
            )?)
        }
    };

    let mut scheduler = Scheduler::new(SchedulerSettings::from_config(config, config_hash), fetcher)
        .with_snapshot_writer(Arc::new(SqliteSnapshotWriter::new(&exp_dir)));

    if scheduler.state().frontier().uses_oracle() {
        let oracle_config = config.oracle.as_ref().ok_or_else(|| {
            ConfigError::Validation("frontier-type oracle-quality needs an [oracle] section".to_string())
        })?;
        let oracle = build_oracle(oracle_config, corpus.as_deref())?;
        tracing::info!("Using {} oracle", oracle.backend_name());
        scheduler = scheduler.with_oracle(oracle);
    }
    if config.snapshot.store_content {
        let store = ContentStore::open(&exp_dir.join(CONTENT_DATABASE_FILE))?;
        scheduler = scheduler.with_content_store(Arc::new(store));
    }
    if let Some(stop) = stop {
        scheduler = scheduler.with_stop_handle(stop);
    }

    let seeds = resolve_seeds(&config.seeds, corpus.as_deref(), config.crawler.random_seed)?;
    let admitted = scheduler.seed(&seeds)?;
    if admitted.is_empty() {
        tracing::warn!("No seed was admitted; the crawl will end immediately");
    }
    write_seed_file(&exp_dir.join(SEEDS_FILE), &admitted)?;

    scheduler.run().await
}

/// Builds the quality oracle from its configuration
///
/// A table backend without `scores-path` uses the corpus `quality` column.
pub fn build_oracle(config: &OracleConfig, corpus: Option<&CorpusFetcher>) -> Result<QualityOracle> {
    let backend: Arc<dyn OracleBackend> = match config.backend {
        OracleBackendKind::Table => {
            let table = match (&config.scores_path, corpus) {
                (Some(path), _) => TableBackend::from_tsv(path)?,
                (None, Some(corpus)) => TableBackend::from_scores(corpus.quality_scores()),
                (None, None) => {
                    return Err(ConfigError::Validation(
                        "oracle.scores-path is required without a corpus".to_string(),
                    )
                    .into())
                }
            };
            tracing::info!("Loaded {} oracle scores", table.len());
            Arc::new(table)
        }
        OracleBackendKind::Heuristic => Arc::new(HeuristicBackend::new(config.use_inlinks)),
    };

    Ok(QualityOracle::new(backend, config.default_score).with_seed_score(config.seed_score))
}
