use crate::frontier::{FrontierEntry, FrontierStrategy};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Score given to entries inserted without one
const MIN_PRIORITY: f64 = 0.0;

/// Heap item: higher score first, then earlier discovery
#[derive(Debug)]
struct Prioritized {
    score: f64,
    entry: FrontierEntry,
}

impl PartialEq for Prioritized {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Prioritized {}

impl PartialOrd for Prioritized {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Prioritized {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.entry.seq.cmp(&self.entry.seq))
    }
}

/// Priority queue keyed by descending oracle score
///
/// Ties are broken by discovery sequence, earliest first, so the dequeue order
/// is fully determined by the scores and the insertion sequence. Scores are
/// fixed at insertion.
#[derive(Debug, Default)]
pub struct OracleFrontier {
    heap: BinaryHeap<Prioritized>,
}

impl FrontierStrategy for OracleFrontier {
    fn push(&mut self, entry: FrontierEntry) {
        let score = match entry.score {
            Some(s) if !s.is_nan() => s,
            _ => MIN_PRIORITY,
        };
        self.heap.push(Prioritized { score, entry });
    }

    fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop().map(|p| p.entry)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}
