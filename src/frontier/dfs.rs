use crate::frontier::{FrontierEntry, FrontierStrategy};

/// Last in, first out: the most recently discovered URL is fetched next
#[derive(Debug, Default)]
pub struct DfsFrontier {
    stack: Vec<FrontierEntry>,
}

impl FrontierStrategy for DfsFrontier {
    fn push(&mut self, entry: FrontierEntry) {
        self.stack.push(entry);
    }

    fn pop(&mut self) -> Option<FrontierEntry> {
        self.stack.pop()
    }

    fn len(&self) -> usize {
        self.stack.len()
    }
}
