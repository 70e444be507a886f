//! Crawl scheduler
//!
//! The scheduler owns the URL registry and the crawl state and drives the
//! fetch loop:
//!
//! 1. Stop when the stop signal is raised, the budget is spent, or nothing is
//!    left to fetch and nothing is in flight
//! 2. Dispatch entries from the frontier to fetch tasks, up to the worker
//!    count, holding back entries whose host is inside its politeness interval
//! 3. On completion, mark the record fetched or failed, expand the page's
//!    outlinks into the registry and frontier, and write any due snapshot
//!
//! Fetch tasks only fetch. Every registry and frontier mutation happens on
//! the scheduler's own loop, so discovery of the same URL from several pages
//! can never produce two frontier entries.

use crate::config::{Config, FrontierType};
use crate::crawler::fetcher::{FetchError, FetchedPage, Fetcher};
use crate::crawler::report::CrawlReport;
use crate::crawler::state::{Budget, CrawlPhase, CrawlState};
use crate::crawler::stop::StopHandle;
use crate::frontier::{Frontier, FrontierEntry};
use crate::oracle::{OracleFeatures, QualityOracle};
use crate::registry::{FetchOutcome, Seq, UrlRegistry};
use crate::snapshot::{
    CheckpointPlan, ContentStore, SnapshotHandle, SnapshotLabel, SnapshotRequest, SnapshotWriter,
};
use crate::url::{canonicalize, CanonicalUrl};
use crate::{ConfigError, CrawlError, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{Id, JoinError, JoinHandle, JoinSet};

/// Tunables of a scheduler run
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Successful fetches allowed; `-1` for unbounded
    pub max_pages: i64,
    pub frontier_type: FrontierType,
    /// Maximum concurrent fetches
    pub workers: usize,
    /// Minimum time between two fetch starts on the same host
    pub politeness_interval: Duration,
    pub fetch_timeout: Duration,
    /// Raise the stop signal after this long
    pub max_duration: Option<Duration>,
    /// How long in-flight fetches may run after a stop before being abandoned
    pub shutdown_grace: Duration,
    pub random_seed: u64,
    /// Log a progress line every this many successful fetches
    pub progress_every: u64,
    pub checkpoints: CheckpointPlan,
    pub exp_name: String,
    pub config_hash: Option<String>,
}

impl SchedulerSettings {
    pub fn new(max_pages: i64, frontier_type: FrontierType) -> Self {
        Self {
            max_pages,
            frontier_type,
            workers: 1,
            politeness_interval: Duration::ZERO,
            fetch_timeout: Duration::from_secs(30),
            max_duration: None,
            shutdown_grace: Duration::from_secs(5),
            random_seed: 42,
            progress_every: 100,
            checkpoints: CheckpointPlan::none(),
            exp_name: "default".to_string(),
            config_hash: None,
        }
    }

    pub fn from_config(config: &Config, config_hash: Option<String>) -> Self {
        let crawler = &config.crawler;
        Self {
            max_pages: crawler.max_pages,
            frontier_type: crawler.frontier_type,
            workers: crawler.workers.max(1) as usize,
            politeness_interval: Duration::from_millis(crawler.politeness_interval_ms),
            fetch_timeout: Duration::from_millis(crawler.fetch_timeout_ms),
            max_duration: crawler.max_duration_secs.map(Duration::from_secs),
            shutdown_grace: Duration::from_millis(crawler.shutdown_grace_ms),
            random_seed: crawler.random_seed,
            progress_every: crawler.progress_every.max(1),
            checkpoints: CheckpointPlan::from_config(&config.snapshot),
            exp_name: config.experiment.name.clone(),
            config_hash,
        }
    }
}

/// What a fetch task hands back to the scheduler
struct FetchTaskOutput {
    result: std::result::Result<FetchedPage, FetchError>,
    content_hash: Option<String>,
}

/// Entries being fetched, by sequence and by the id of their fetch task
#[derive(Debug, Default)]
struct InFlight {
    entries: HashMap<Seq, FrontierEntry>,
    tasks: HashMap<Id, Seq>,
}

impl InFlight {
    fn insert(&mut self, task: Id, entry: FrontierEntry) {
        self.tasks.insert(task, entry.seq);
        self.entries.insert(entry.seq, entry);
    }

    /// Removes the entry whose task finished, with or without a result
    fn remove_task(&mut self, task: Id) -> Option<FrontierEntry> {
        let seq = self.tasks.remove(&task)?;
        self.entries.remove(&seq)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drain(&mut self) -> impl Iterator<Item = FrontierEntry> + '_ {
        self.tasks.clear();
        self.entries.drain().map(|(_, entry)| entry)
    }
}

/// What the oracle may learn about a fetched page when scoring its outlinks
#[derive(Debug, Clone, Copy)]
struct ParentFeatures {
    score: Option<f64>,
    inlinks: u32,
}

/// Aborts the wrapped task when dropped, so aborting a fetch task also stops its fetch
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Drives a single crawl from seeds to termination
pub struct Scheduler {
    settings: SchedulerSettings,
    fetcher: Arc<dyn Fetcher>,
    oracle: Option<QualityOracle>,
    snapshot_writer: Option<Arc<dyn SnapshotWriter>>,
    content_store: Option<Arc<ContentStore>>,
    stop: StopHandle,
    registry: UrlRegistry,
    state: CrawlState,
    snapshots: Vec<SnapshotHandle>,
}

impl Scheduler {
    pub fn new(settings: SchedulerSettings, fetcher: Arc<dyn Fetcher>) -> Self {
        let frontier = Frontier::new(settings.frontier_type, settings.random_seed);
        let state = CrawlState::new(
            frontier,
            Budget::from_max_pages(settings.max_pages),
            settings.politeness_interval,
        );
        Self {
            settings,
            fetcher,
            oracle: None,
            snapshot_writer: None,
            content_store: None,
            stop: StopHandle::new(),
            registry: UrlRegistry::new(),
            state,
            snapshots: Vec::new(),
        }
    }

    /// Sets the quality oracle; required for the oracle-quality frontier
    pub fn with_oracle(mut self, oracle: QualityOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_snapshot_writer(mut self, writer: Arc<dyn SnapshotWriter>) -> Self {
        self.snapshot_writer = Some(writer);
        self
    }

    pub fn with_content_store(mut self, store: Arc<ContentStore>) -> Self {
        self.content_store = Some(store);
        self
    }

    /// Uses an externally created stop handle
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn registry(&self) -> &UrlRegistry {
        &self.registry
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn phase(&self) -> CrawlPhase {
        self.state.phase
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    fn check_ready(&self) -> Result<()> {
        if self.state.phase != CrawlPhase::Idle {
            return Err(CrawlError::InvalidPhase(self.state.phase));
        }
        if self.state.frontier().uses_oracle() && self.oracle.is_none() {
            return Err(ConfigError::Validation(
                "frontier type oracle-quality needs a quality oracle".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Registers seed URLs and inserts them into the frontier
    ///
    /// Malformed seeds and seeds the fetcher cannot serve are skipped and
    /// counted; duplicates are admitted once. Under the oracle strategy seeds
    /// get the oracle's seed score instead of being scored. Returns the
    /// admitted seeds in order.
    pub fn seed<S: AsRef<str>>(&mut self, seeds: &[S]) -> Result<Vec<CanonicalUrl>> {
        self.check_ready()?;

        let seed_score = match (self.state.frontier().uses_oracle(), &self.oracle) {
            (true, Some(oracle)) => Some(oracle.seed_score()),
            _ => None,
        };

        let mut admitted = Vec::new();
        for raw in seeds {
            let raw = raw.as_ref();
            let url = match canonicalize(raw) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Skipping malformed seed '{}': {}", raw, e);
                    self.state.counters.malformed_seeds += 1;
                    continue;
                }
            };

            if !self.fetcher.is_fetchable(&url) {
                tracing::warn!("Skipping seed {}: not available to the fetcher", url);
                self.state.counters.missing_seeds += 1;
                continue;
            }

            let (record, is_new) = self.registry.register_if_absent(url.clone(), None);
            if !is_new {
                tracing::debug!("Duplicate seed {}", url);
                continue;
            }
            let seq = record.seq;

            if let Some(score) = seed_score {
                self.registry.set_oracle_score(seq, score)?;
            }
            if let Some(record) = self.registry.get(seq) {
                self.state.frontier_mut().insert_record(record, seed_score);
            }
            admitted.push(url);
        }

        tracing::info!(
            "Seeded frontier with {} URLs ({} malformed, {} missing)",
            admitted.len(),
            self.state.counters.malformed_seeds,
            self.state.counters.missing_seeds
        );

        Ok(admitted)
    }

    /// Runs the crawl to termination
    ///
    /// Per-URL failures are recorded on their records and never abort the run.
    /// Only a registry invariant violation is returned as an error.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.check_ready()?;
        self.state.phase = CrawlPhase::Running;

        let started = Instant::now();
        let deadline = self.settings.max_duration.map(|d| started + d);
        let workers = self.settings.workers.max(1);

        tracing::info!(
            "Starting crawl '{}': frontier={}, max_pages={}, workers={}, politeness={:?}",
            self.settings.exp_name,
            self.settings.frontier_type,
            self.settings.max_pages,
            workers,
            self.settings.politeness_interval
        );

        let mut tasks: JoinSet<FetchTaskOutput> = JoinSet::new();
        let mut in_flight = InFlight::default();
        let mut stop_rx = self.stop.subscribe();

        let reason = loop {
            if self.stop.is_stopped() {
                tracing::info!("Stop signal received");
                break CrawlPhase::Stopped;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::info!("Maximum crawl duration reached");
                break CrawlPhase::Stopped;
            }
            if self.state.budget.is_exhausted(self.state.pages_fetched) {
                break CrawlPhase::BudgetExhausted;
            }

            self.dispatch(&mut tasks, &mut in_flight, workers);

            if tasks.is_empty() && self.state.is_drained() {
                break CrawlPhase::FrontierExhausted;
            }

            let has_capacity = in_flight.len() < workers
                && self
                    .state
                    .budget
                    .allows_dispatch(self.state.pages_fetched, in_flight.len() as u64);
            let wake = if has_capacity {
                self.state.next_deferred_wake(Instant::now())
            } else {
                None
            };

            tokio::select! {
                _ = stop_rx.changed() => {}
                _ = sleep_until(deadline), if deadline.is_some() => {}
                Some(joined) = tasks.join_next_with_id(), if !tasks.is_empty() => {
                    if let Err(e) = self.complete(joined, &mut in_flight, started).await {
                        tracing::error!("Aborting crawl: {}", e);
                        return Err(e);
                    }
                }
                _ = sleep_until(wake), if wake.is_some() => {}
            }
        };

        debug_assert!(reason.is_stop_reason());
        self.state.phase = reason;
        tracing::info!("Crawl loop ended: {}", reason);

        if !in_flight.is_empty() {
            self.shut_down(tasks, in_flight).await?;
        }

        self.checkpoint(SnapshotLabel::Final).await;
        self.state.phase = CrawlPhase::Terminated;

        let report = CrawlReport {
            reason,
            pages_fetched: self.state.pages_fetched,
            counts: self.registry.counts_by_status(),
            counters: self.state.counters.clone(),
            snapshots: self.snapshots.clone(),
            duration: started.elapsed(),
            frontier_remaining: self.state.frontier().len(),
            deferred_remaining: self.state.deferred_len(),
        };

        tracing::info!(
            "Crawl terminated ({}) after {:.1}s: {} fetched, {} failed, {} skipped, {} pending",
            reason,
            report.duration.as_secs_f64(),
            report.counts.fetched,
            report.counts.failed,
            report.counts.skipped,
            report.counts.pending
        );

        Ok(report)
    }

    fn dispatch(
        &mut self,
        tasks: &mut JoinSet<FetchTaskOutput>,
        in_flight: &mut InFlight,
        workers: usize,
    ) {
        let now = Instant::now();
        while in_flight.len() < workers
            && self
                .state
                .budget
                .allows_dispatch(self.state.pages_fetched, in_flight.len() as u64)
        {
            let Some(entry) = self.state.next_dispatchable(now) else {
                break;
            };

            tracing::debug!("Fetching {} (depth {})", entry.url, entry.depth);
            self.state.record_dispatch(entry.host(), now);

            let task = tasks.spawn(fetch_task(
                Arc::clone(&self.fetcher),
                entry.url.clone(),
                self.settings.fetch_timeout,
                self.content_store.clone(),
            ));
            in_flight.insert(task.id(), entry);
        }
    }

    async fn complete(
        &mut self,
        joined: std::result::Result<(Id, FetchTaskOutput), JoinError>,
        in_flight: &mut InFlight,
        started: Instant,
    ) -> Result<()> {
        let (task, output) = match joined {
            Ok(joined) => joined,
            Err(e) => return self.record_lost_task(e, in_flight),
        };

        let Some(entry) = in_flight.remove_task(task) else {
            tracing::warn!("Result for unknown fetch task {} ignored", task);
            return Ok(());
        };
        self.state.record_completion(entry.host());

        match output.result {
            Ok(page) => {
                self.record_success(&entry, page, output.content_hash)?;
                self.log_progress(started);
                if self.settings.checkpoints.is_checkpoint(self.state.pages_fetched) {
                    self.checkpoint(SnapshotLabel::Limit(self.state.pages_fetched))
                        .await;
                }
            }
            Err(error) => {
                tracing::warn!("Failed to fetch {}: {}", entry.url, error);
                self.registry.mark_fetched(
                    &entry.url,
                    FetchOutcome::failed(error.to_string(), error.http_status()),
                )?;
            }
        }

        Ok(())
    }

    /// Releases the slot of a fetch task that panicked or was cancelled
    ///
    /// Its URL is marked Failed so the host and the worker slot are freed and
    /// the crawl does not wait on a result that will never come.
    fn record_lost_task(&mut self, error: JoinError, in_flight: &mut InFlight) -> Result<()> {
        let Some(entry) = in_flight.remove_task(error.id()) else {
            tracing::error!("Fetch task ended without a result: {}", error);
            return Ok(());
        };
        tracing::error!("Fetch task for {} ended without a result: {}", entry.url, error);
        self.state.record_completion(entry.host());
        self.registry.mark_fetched(
            &entry.url,
            FetchOutcome::failed(format!("fetch task failed: {}", error), None),
        )?;
        Ok(())
    }

    fn record_success(
        &mut self,
        entry: &FrontierEntry,
        page: FetchedPage,
        content_hash: Option<String>,
    ) -> Result<()> {
        let outcome = FetchOutcome::fetched(
            content_hash.unwrap_or_else(|| hash_content(&page.content)),
            page.outlinks.len() as u32,
            page.http_status,
            page.docno.clone(),
        );
        let parent = self.registry.mark_fetched(&entry.url, outcome)?;
        let parent_features = ParentFeatures {
            score: parent.oracle_score,
            inlinks: parent.inlink_count,
        };
        self.state.pages_fetched += 1;

        tracing::debug!(
            "Fetched {} ({} outlinks, {} total)",
            entry.url,
            page.outlinks.len(),
            self.state.pages_fetched
        );

        if page.outlinks.is_empty() {
            self.state.counters.pages_without_outlinks += 1;
            return Ok(());
        }

        self.expand(&entry.url, &page, parent_features)
    }

    /// Registers the page's outlinks in extraction order and inserts the new ones
    fn expand(
        &mut self,
        parent: &CanonicalUrl,
        page: &FetchedPage,
        parent_features: ParentFeatures,
    ) -> Result<()> {
        let uses_oracle = self.state.frontier().uses_oracle();
        let mut inserted = 0usize;

        for outlink in &page.outlinks {
            let url = match canonicalize(&outlink.url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::trace!("Skipping malformed outlink '{}': {}", outlink.url, e);
                    self.state.counters.malformed_outlinks += 1;
                    continue;
                }
            };
            if url == *parent {
                continue;
            }
            if !self.fetcher.is_fetchable(&url) {
                self.state.counters.unfetchable_outlinks += 1;
                continue;
            }

            let (record, is_new) = self.registry.register_if_absent(url, Some(parent));
            if !is_new {
                continue;
            }
            let seq = record.seq;

            let score = match (uses_oracle, &self.oracle) {
                (true, Some(oracle)) => {
                    let features = OracleFeatures {
                        anchor_text: outlink.anchor.as_deref(),
                        parent_title: page.title.as_deref(),
                        parent_score: parent_features.score,
                        parent_inlinks: Some(parent_features.inlinks),
                    };
                    let scored = oracle.score(record, &features);
                    if scored.fell_back {
                        self.state.counters.oracle_fallbacks += 1;
                    }
                    Some(scored.value)
                }
                _ => None,
            };

            if let Some(value) = score {
                self.registry.set_oracle_score(seq, value)?;
            }
            if let Some(record) = self.registry.get(seq) {
                if self.state.frontier_mut().insert_record(record, score) {
                    inserted += 1;
                }
            }
        }

        tracing::trace!("{} new URLs from {}", inserted, parent);
        Ok(())
    }

    fn log_progress(&self, started: Instant) {
        let fetched = self.state.pages_fetched;
        if fetched % self.settings.progress_every.max(1) != 0 {
            return;
        }
        let rate = fetched as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
        tracing::info!(
            "Progress: {} pages fetched, {} in frontier, {} deferred, {:.2} pages/sec",
            fetched,
            self.state.frontier().len(),
            self.state.deferred_len(),
            rate
        );
    }

    /// Writes a snapshot of every fetched record on a blocking thread
    ///
    /// A failed write is logged and counted; the crawl goes on and the next
    /// checkpoint includes everything again.
    async fn checkpoint(&mut self, label: SnapshotLabel) {
        let Some(writer) = self.snapshot_writer.clone() else {
            return;
        };

        let request = SnapshotRequest {
            label,
            exp_name: self.settings.exp_name.clone(),
            frontier_type: self.settings.frontier_type,
            config_hash: self.settings.config_hash.clone(),
            records: self.registry.fetched_records().cloned().collect(),
        };

        match tokio::task::spawn_blocking(move || writer.write(request)).await {
            Ok(Ok(handle)) => {
                self.state.counters.snapshots_written += 1;
                self.snapshots.push(handle);
            }
            Ok(Err(e)) => {
                tracing::warn!("Snapshot {} failed, continuing: {}", label, e);
                self.state.counters.snapshots_failed += 1;
            }
            Err(e) => {
                tracing::warn!("Snapshot {} task failed, continuing: {}", label, e);
                self.state.counters.snapshots_failed += 1;
            }
        }
    }

    /// Lets in-flight fetches finish within the grace period, then abandons them
    ///
    /// Results that arrive after the stop are discarded and their records
    /// marked Skipped.
    async fn shut_down(
        &mut self,
        mut tasks: JoinSet<FetchTaskOutput>,
        mut in_flight: InFlight,
    ) -> Result<()> {
        tracing::info!(
            "Waiting up to {:?} for {} in-flight fetches",
            self.settings.shutdown_grace,
            in_flight.len()
        );

        let grace_deadline =
            tokio::time::Instant::now() + self.settings.shutdown_grace;
        while let Ok(Some(_)) = tokio::time::timeout_at(grace_deadline, tasks.join_next()).await {}
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}

        for entry in in_flight.drain() {
            self.state.record_completion(entry.host());
            self.registry
                .mark_fetched(&entry.url, FetchOutcome::skipped("crawl stopped"))?;
            self.state.counters.discarded_results += 1;
        }

        Ok(())
    }
}

async fn fetch_task(
    fetcher: Arc<dyn Fetcher>,
    url: CanonicalUrl,
    timeout: Duration,
    content_store: Option<Arc<ContentStore>>,
) -> FetchTaskOutput {
    let task_url = url.clone();
    let mut handle = AbortOnDrop(tokio::spawn(async move { fetcher.fetch(&task_url).await }));

    let result = match tokio::time::timeout(timeout, &mut handle.0).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(FetchError::Network(format!("fetch task failed: {}", e))),
        Err(_) => Err(FetchError::Timeout(timeout)),
    };

    let content_hash = result.as_ref().ok().map(|page| hash_content(&page.content));

    if let (Ok(page), Some(hash), Some(store)) = (&result, &content_hash, content_store) {
        let hash = hash.clone();
        let content = page.content.clone();
        let url_str = url.to_string();
        match tokio::task::spawn_blocking(move || store.put(&hash, &url_str, &content)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!("Failed to store content of {}: {}", url, e),
            Err(e) => tracing::warn!("Content store task failed for {}: {}", url, e),
        }
    }

    FetchTaskOutput {
        result,
        content_hash,
    }
}

/// Hex SHA-256 of the page content
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}
