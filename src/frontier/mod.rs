//! Frontier strategies
//!
//! A [`Frontier`] holds discovered, not-yet-fetched URLs and decides which one
//! is fetched next. The strategy is a closed set selected by [`FrontierType`];
//! each variant implements [`FrontierStrategy`] and `Frontier` adds the
//! idempotent-insert bookkeeping shared by all of them.

mod bfs;
mod dfs;
mod priority;
mod random;

use crate::config::FrontierType;
use crate::registry::{Seq, UrlRecord};
use crate::url::CanonicalUrl;
use std::cmp::Ordering;
use std::collections::HashSet;

pub use bfs::BfsFrontier;
pub use dfs::DfsFrontier;
pub use priority::OracleFrontier;
pub use random::RandomFrontier;

/// A reference to a URL record plus its ordering key
#[derive(Debug, Clone, PartialEq)]
pub struct FrontierEntry {
    /// Discovery sequence of the record; BFS/DFS order and oracle tie-breaks use it
    pub seq: Seq,
    pub url: CanonicalUrl,
    pub depth: u32,
    /// Oracle score, set only under the quality-oracle strategy
    pub score: Option<f64>,
}

impl FrontierEntry {
    pub fn from_record(record: &UrlRecord, score: Option<f64>) -> Self {
        Self {
            seq: record.seq,
            url: record.url.clone(),
            depth: record.depth,
            score,
        }
    }

    pub fn host(&self) -> &str {
        self.url.host()
    }
}

/// Position of an entry in its strategy's dispatch order; greater goes first
///
/// Agrees with the pop order of the strategies: BFS pops the lowest sequence,
/// DFS the highest, and the oracle strategy the highest score, earliest
/// sequence on ties. Random has no order to keep; its keys are oldest first.
#[derive(Debug, Clone, Copy)]
pub struct DispatchKey {
    score: f64,
    seq: Seq,
    newest_first: bool,
}

impl DispatchKey {
    pub fn new(frontier_type: FrontierType, entry: &FrontierEntry) -> Self {
        let score = match (frontier_type, entry.score) {
            (FrontierType::OracleQuality, Some(s)) if !s.is_nan() => s,
            _ => 0.0,
        };
        Self {
            score,
            seq: entry.seq,
            newest_first: frontier_type == FrontierType::Dfs,
        }
    }
}

impl PartialEq for DispatchKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DispatchKey {}

impl PartialOrd for DispatchKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DispatchKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score).then_with(|| {
            if self.newest_first {
                self.seq.cmp(&other.seq)
            } else {
                other.seq.cmp(&self.seq)
            }
        })
    }
}

/// Ordering contract implemented by every strategy
pub trait FrontierStrategy {
    /// Adds an entry; duplicates are filtered by [`Frontier`] before this is called
    fn push(&mut self, entry: FrontierEntry);

    /// Removes and returns the next entry, or `None` when empty
    fn pop(&mut self) -> Option<FrontierEntry>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
enum Strategy {
    Bfs(BfsFrontier),
    Dfs(DfsFrontier),
    Oracle(OracleFrontier),
    Random(RandomFrontier),
}

impl Strategy {
    fn inner(&mut self) -> &mut dyn FrontierStrategy {
        match self {
            Strategy::Bfs(s) => s,
            Strategy::Dfs(s) => s,
            Strategy::Oracle(s) => s,
            Strategy::Random(s) => s,
        }
    }

    fn len(&self) -> usize {
        match self {
            Strategy::Bfs(s) => s.len(),
            Strategy::Dfs(s) => s.len(),
            Strategy::Oracle(s) => s.len(),
            Strategy::Random(s) => s.len(),
        }
    }
}

/// The active frontier of a crawl
///
/// Every record is admitted at most once: an entry that was ever inserted,
/// whether still queued or already consumed, is never inserted again.
#[derive(Debug)]
pub struct Frontier {
    frontier_type: FrontierType,
    strategy: Strategy,
    admitted: HashSet<Seq>,
}

impl Frontier {
    /// Creates an empty frontier; `random_seed` only affects the random strategy
    pub fn new(frontier_type: FrontierType, random_seed: u64) -> Self {
        let strategy = match frontier_type {
            FrontierType::Bfs => Strategy::Bfs(BfsFrontier::default()),
            FrontierType::Dfs => Strategy::Dfs(DfsFrontier::default()),
            FrontierType::OracleQuality => Strategy::Oracle(OracleFrontier::default()),
            FrontierType::Random => Strategy::Random(RandomFrontier::new(random_seed)),
        };
        Self {
            frontier_type,
            strategy,
            admitted: HashSet::new(),
        }
    }

    pub fn frontier_type(&self) -> FrontierType {
        self.frontier_type
    }

    /// True if this strategy orders by oracle score
    pub fn uses_oracle(&self) -> bool {
        self.frontier_type == FrontierType::OracleQuality
    }

    /// Inserts an entry unless its record was admitted before
    ///
    /// Returns whether the entry was added. Re-inserting is a no-op, not an error.
    pub fn insert(&mut self, entry: FrontierEntry) -> bool {
        if !self.admitted.insert(entry.seq) {
            return false;
        }
        self.strategy.inner().push(entry);
        true
    }

    /// Inserts a registry record if it is still Pending
    pub fn insert_record(&mut self, record: &UrlRecord, score: Option<f64>) -> bool {
        if record.status.is_terminal() {
            return false;
        }
        self.insert(FrontierEntry::from_record(record, score))
    }

    /// Removes and returns the next entry; `None` means the frontier is exhausted
    pub fn next(&mut self) -> Option<FrontierEntry> {
        self.strategy.inner().pop()
    }

    pub fn len(&self) -> usize {
        self.strategy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, seq: Seq) -> bool {
        self.admitted.contains(&seq)
    }

    pub fn dispatch_key(&self, entry: &FrontierEntry) -> DispatchKey {
        DispatchKey::new(self.frontier_type, entry)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::registry::{FetchOutcome, UrlRegistry};
    use crate::url::canonicalize;

    pub(crate) fn entry(seq: Seq, url: &str, score: Option<f64>) -> FrontierEntry {
        FrontierEntry {
            seq,
            url: canonicalize(url).unwrap(),
            depth: 0,
            score,
        }
    }

    fn drain(frontier: &mut Frontier) -> Vec<Seq> {
        std::iter::from_fn(|| frontier.next()).map(|e| e.seq).collect()
    }

    #[test]
    fn test_idempotent_insert() {
        for ft in FrontierType::all() {
            let mut frontier = Frontier::new(*ft, 7);
            let e = entry(0, "http://a.example/", Some(0.5));

            assert!(frontier.insert(e.clone()));
            for _ in 0..5 {
                assert!(!frontier.insert(e.clone()));
            }
            assert_eq!(frontier.len(), 1, "{}", ft);
        }
    }

    #[test]
    fn test_no_reinsert_after_consumption() {
        let mut frontier = Frontier::new(FrontierType::Bfs, 0);
        let e = entry(0, "http://a.example/", None);

        frontier.insert(e.clone());
        assert_eq!(frontier.next().map(|e| e.seq), Some(0));
        assert!(!frontier.insert(e));
        assert!(frontier.next().is_none());
    }

    #[test]
    fn test_insert_record_skips_terminal() {
        let mut registry = UrlRegistry::new();
        let a = canonicalize("http://a.example/").unwrap();
        registry.register_if_absent(a.clone(), None);
        registry
            .mark_fetched(&a, FetchOutcome::failed("boom", None))
            .unwrap();

        let mut frontier = Frontier::new(FrontierType::Bfs, 0);
        assert!(!frontier.insert_record(registry.lookup(&a).unwrap(), None));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_empty_is_terminal_signal() {
        for ft in FrontierType::all() {
            let mut frontier = Frontier::new(*ft, 0);
            assert!(frontier.next().is_none());
            assert!(frontier.is_empty());
        }
    }

    #[test]
    fn test_strategies_dispatch() {
        let mut bfs = Frontier::new(FrontierType::Bfs, 0);
        let mut dfs = Frontier::new(FrontierType::Dfs, 0);
        let mut oracle = Frontier::new(FrontierType::OracleQuality, 0);
        for (seq, score) in [(0, 0.1), (1, 0.9), (2, 0.5)] {
            let e = entry(seq, &format!("http://h{}.example/", seq), Some(score));
            bfs.insert(e.clone());
            dfs.insert(e.clone());
            oracle.insert(e);
        }

        assert_eq!(drain(&mut bfs), vec![0, 1, 2]);
        assert_eq!(drain(&mut dfs), vec![2, 1, 0]);
        assert_eq!(drain(&mut oracle), vec![1, 2, 0]);
        assert!(oracle.uses_oracle());
        assert!(!bfs.uses_oracle());
    }

    #[test]
    fn test_dispatch_key_agrees_with_pop_order() {
        let entries = [
            entry(0, "http://h0.example/", Some(0.1)),
            entry(1, "http://h1.example/", Some(0.9)),
            entry(2, "http://h2.example/", Some(0.5)),
            entry(3, "http://h3.example/", Some(0.9)),
        ];
        for ft in [FrontierType::Bfs, FrontierType::Dfs, FrontierType::OracleQuality] {
            let mut frontier = Frontier::new(ft, 0);
            for e in &entries {
                frontier.insert(e.clone());
            }
            let popped = drain(&mut frontier);

            let mut by_key = entries.to_vec();
            by_key.sort_by(|a, b| frontier.dispatch_key(b).cmp(&frontier.dispatch_key(a)));
            let keyed: Vec<Seq> = by_key.iter().map(|e| e.seq).collect();
            assert_eq!(popped, keyed, "{}", ft);
        }
    }
}
