use crate::frontier::{FrontierEntry, FrontierStrategy};
use std::collections::VecDeque;

/// First in, first out by discovery sequence
///
/// With a single worker every depth-d URL is dequeued before any depth-(d+1) URL.
#[derive(Debug, Default)]
pub struct BfsFrontier {
    queue: VecDeque<FrontierEntry>,
}

impl FrontierStrategy for BfsFrontier {
    fn push(&mut self, entry: FrontierEntry) {
        self.queue.push_back(entry);
    }

    fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}
