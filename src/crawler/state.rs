//! Crawl state owned by the scheduler
//!
//! Everything here is mutated only by the scheduler's control loop. Fetch
//! workers never see it, which is what makes frontier pops, registry updates
//! and politeness bookkeeping atomic with respect to each other.

use crate::frontier::{DispatchKey, Frontier, FrontierEntry};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::time::{Duration, Instant};

/// Lifecycle of a scheduler
///
/// `Idle -> Running -> {BudgetExhausted, FrontierExhausted, Stopped} -> Terminated`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    Idle,
    Running,
    BudgetExhausted,
    FrontierExhausted,
    Stopped,
    Terminated,
}

impl CrawlPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlPhase::Idle => "idle",
            CrawlPhase::Running => "running",
            CrawlPhase::BudgetExhausted => "budget-exhausted",
            CrawlPhase::FrontierExhausted => "frontier-exhausted",
            CrawlPhase::Stopped => "stopped",
            CrawlPhase::Terminated => "terminated",
        }
    }

    /// True for the three phases that end the fetch loop
    pub fn is_stop_reason(&self) -> bool {
        matches!(
            self,
            CrawlPhase::BudgetExhausted | CrawlPhase::FrontierExhausted | CrawlPhase::Stopped
        )
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page budget; `None` means unbounded until the frontier is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    limit: Option<u64>,
}

impl Budget {
    /// `-1` (or any negative value) means unbounded
    pub fn from_max_pages(max_pages: i64) -> Self {
        Self {
            limit: u64::try_from(max_pages).ok(),
        }
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn is_exhausted(&self, fetched: u64) -> bool {
        self.limit.is_some_and(|limit| fetched >= limit)
    }

    /// Whether one more fetch may start
    ///
    /// Counting in-flight fetches as potential successes keeps the number of
    /// successful fetches at or below the limit.
    pub fn allows_dispatch(&self, fetched: u64, in_flight: u64) -> bool {
        self.limit.map_or(true, |limit| fetched + in_flight < limit)
    }
}

/// Politeness bookkeeping for one host
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// When the last fetch to this host was dispatched
    pub last_dispatch: Option<Instant>,
    pub in_flight: u32,
    pub fetch_count: u64,
}

impl HostState {
    /// Checks if a fetch to this host may start at `now`
    ///
    /// With a non-zero interval the host must be idle and its last dispatch at
    /// least `interval` ago. A zero interval imposes nothing.
    pub fn can_dispatch(&self, now: Instant, interval: Duration) -> bool {
        if interval.is_zero() {
            return true;
        }
        self.in_flight == 0 && self.time_until_ready(now, interval) == Some(Duration::ZERO)
    }

    /// Time left before the interval has elapsed
    ///
    /// `None` while a fetch to the host is in flight: readiness then depends on
    /// that fetch completing, not on the clock.
    pub fn time_until_ready(&self, now: Instant, interval: Duration) -> Option<Duration> {
        if self.in_flight > 0 && !interval.is_zero() {
            return None;
        }
        Some(match self.last_dispatch {
            Some(last) => interval.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        })
    }

    pub fn record_dispatch(&mut self, now: Instant) {
        self.last_dispatch = Some(now);
        self.in_flight += 1;
        self.fetch_count += 1;
    }

    pub fn record_completion(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

/// Event counters reported at termination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlCounters {
    /// Outlinks whose canonicalization failed
    pub malformed_outlinks: u64,
    /// Outlinks the fetcher cannot serve (outside the corpus)
    pub unfetchable_outlinks: u64,
    pub malformed_seeds: u64,
    /// Seeds the fetcher cannot serve
    pub missing_seeds: u64,
    pub pages_without_outlinks: u64,
    /// Entries moved to a host's deferred area by politeness
    pub deferrals: u64,
    pub oracle_fallbacks: u64,
    pub snapshots_written: u64,
    pub snapshots_failed: u64,
    /// Fetch results that arrived after the stop signal and were dropped
    pub discarded_results: u64,
}

/// An entry held back by politeness, ordered by its dispatch key
#[derive(Debug)]
struct Held {
    key: DispatchKey,
    entry: FrontierEntry,
}

impl PartialEq for Held {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Held {}

impl PartialOrd for Held {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Held {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Process-wide crawl state, owned by one scheduler
#[derive(Debug)]
pub struct CrawlState {
    pub phase: CrawlPhase,
    pub pages_fetched: u64,
    pub budget: Budget,
    pub counters: CrawlCounters,
    frontier: Frontier,
    politeness_interval: Duration,
    hosts: HashMap<String, HostState>,
    /// Per-host entries held back by politeness, in strategy order
    deferred: HashMap<String, BinaryHeap<Held>>,
    deferred_len: usize,
}

impl CrawlState {
    pub fn new(frontier: Frontier, budget: Budget, politeness_interval: Duration) -> Self {
        Self {
            phase: CrawlPhase::Idle,
            pages_fetched: 0,
            budget,
            counters: CrawlCounters::default(),
            frontier,
            politeness_interval,
            hosts: HashMap::new(),
            deferred: HashMap::new(),
            deferred_len: 0,
        }
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn frontier_mut(&mut self) -> &mut Frontier {
        &mut self.frontier
    }

    pub fn politeness_interval(&self) -> Duration {
        self.politeness_interval
    }

    pub fn host(&self, host: &str) -> Option<&HostState> {
        self.hosts.get(host)
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred_len
    }

    /// True when neither the frontier nor the deferred area holds anything
    pub fn is_drained(&self) -> bool {
        self.frontier.is_empty() && self.deferred_len == 0
    }

    fn is_ready(&self, host: &str, now: Instant) -> bool {
        self.hosts
            .get(host)
            .map_or(true, |h| h.can_dispatch(now, self.politeness_interval))
    }

    /// Picks the next entry that may be fetched at `now`
    ///
    /// Frontier entries whose host is busy or too recent move to that host's
    /// deferred area. The first frontier entry with a ready host then competes
    /// with the deferred entries of ready hosts, and the one that comes first
    /// in strategy order wins. Deferral therefore never changes the relative
    /// order of two entries on the same host.
    pub fn next_dispatchable(&mut self, now: Instant) -> Option<FrontierEntry> {
        let mut candidate = None;
        while let Some(entry) = self.frontier.next() {
            if self.is_ready(entry.host(), now) {
                candidate = Some(entry);
                break;
            }
            tracing::trace!("Deferring {} (host {} not ready)", entry.url, entry.host());
            self.counters.deferrals += 1;
            self.hold(entry);
        }

        let held = self.best_ready_deferred(now);
        match (candidate, held) {
            (Some(entry), Some((host, key))) if key > self.frontier.dispatch_key(&entry) => {
                // Everything left in the frontier comes after `entry`
                self.hold(entry);
                self.pop_deferred(&host)
            }
            (Some(entry), _) => Some(entry),
            (None, Some((host, _))) => self.pop_deferred(&host),
            (None, None) => None,
        }
    }

    fn hold(&mut self, entry: FrontierEntry) {
        let key = self.frontier.dispatch_key(&entry);
        self.deferred
            .entry(entry.host().to_string())
            .or_default()
            .push(Held { key, entry });
        self.deferred_len += 1;
    }

    /// The ready host whose deferred head comes first, with that head's key
    fn best_ready_deferred(&self, now: Instant) -> Option<(String, DispatchKey)> {
        self.deferred
            .iter()
            .filter(|(host, _)| self.is_ready(host, now))
            .filter_map(|(host, heap)| heap.peek().map(|held| (held.key, host)))
            .max_by_key(|(key, _)| *key)
            .map(|(key, host)| (host.clone(), key))
    }

    fn pop_deferred(&mut self, host: &str) -> Option<FrontierEntry> {
        let heap = self.deferred.get_mut(host)?;
        let held = heap.pop()?;
        if heap.is_empty() {
            self.deferred.remove(host);
        }
        self.deferred_len -= 1;
        Some(held.entry)
    }

    /// Earliest instant at which a deferred entry becomes ready by the clock
    ///
    /// Hosts with a fetch in flight are skipped; their completion wakes the
    /// scheduler instead.
    pub fn next_deferred_wake(&self, now: Instant) -> Option<Instant> {
        self.deferred
            .keys()
            .filter_map(|host| match self.hosts.get(host) {
                Some(state) => state
                    .time_until_ready(now, self.politeness_interval)
                    .map(|wait| now + wait),
                None => Some(now),
            })
            .min()
    }

    pub fn record_dispatch(&mut self, host: &str, now: Instant) {
        self.hosts
            .entry(host.to_string())
            .or_default()
            .record_dispatch(now);
    }

    pub fn record_completion(&mut self, host: &str) {
        if let Some(state) = self.hosts.get_mut(host) {
            state.record_completion();
        }
    }
}
