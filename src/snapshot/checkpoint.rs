use crate::config::SnapshotConfig;
use std::collections::BTreeSet;

/// Page counts at which a snapshot is taken
///
/// The union of every multiple of `every` and the explicit `limits`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointPlan {
    every: Option<u64>,
    limits: BTreeSet<u64>,
}

impl CheckpointPlan {
    pub fn new(every: Option<u64>, limits: impl IntoIterator<Item = u64>) -> Self {
        Self {
            every: every.filter(|&n| n > 0),
            limits: limits.into_iter().filter(|&n| n > 0).collect(),
        }
    }

    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self::new(config.every_n_pages, config.limits.iter().copied())
    }

    /// A plan without checkpoints; only the final snapshot is written
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.every.is_none() && self.limits.is_empty()
    }

    pub fn is_checkpoint(&self, pages_fetched: u64) -> bool {
        if pages_fetched == 0 {
            return false;
        }
        self.every.is_some_and(|every| pages_fetched % every == 0)
            || self.limits.contains(&pages_fetched)
    }

    /// All checkpoints `<= max`, ascending
    pub fn checkpoints_up_to(&self, max: u64) -> Vec<u64> {
        let mut points: BTreeSet<u64> = self.limits.range(..=max).copied().collect();
        if let Some(every) = self.every {
            points.extend((1..=max / every).map(|k| k * every));
        }
        points.into_iter().collect()
    }
}
