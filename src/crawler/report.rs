use crate::crawler::state::{CrawlCounters, CrawlPhase};
use crate::registry::StatusCounts;
use crate::snapshot::SnapshotHandle;
use std::time::Duration;

/// Final statistics of a crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Why the fetch loop ended: budget, frontier or stop
    pub reason: CrawlPhase,
    pub pages_fetched: u64,
    pub counts: StatusCounts,
    pub counters: CrawlCounters,
    /// Snapshots written, checkpoints first and `final` last
    pub snapshots: Vec<SnapshotHandle>,
    pub duration: Duration,
    /// Entries never dispatched
    pub frontier_remaining: usize,
    pub deferred_remaining: usize,
}

impl CrawlReport {
    pub fn pages_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.pages_fetched as f64 / secs
        } else {
            0.0
        }
    }
}
