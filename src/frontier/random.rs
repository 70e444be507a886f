use crate::frontier::{FrontierEntry, FrontierStrategy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform random selection, reproducible for a fixed seed and insertion order
#[derive(Debug)]
pub struct RandomFrontier {
    entries: Vec<FrontierEntry>,
    rng: StdRng,
}

impl RandomFrontier {
    pub fn new(seed: u64) -> Self {
        Self {
            entries: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl FrontierStrategy for RandomFrontier {
    fn push(&mut self, entry: FrontierEntry) {
        self.entries.push(entry);
    }

    fn pop(&mut self) -> Option<FrontierEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.entries.len());
        Some(self.entries.swap_remove(index))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
