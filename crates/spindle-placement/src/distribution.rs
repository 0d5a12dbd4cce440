//! Per-node load measured over a key universe.

use std::collections::{BTreeMap, HashSet};

use spindle_types::NodeId;

use crate::Resolver;
use crate::error::PlacementError;
use crate::remap::Assignment;

/// How many keys each node owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadDistribution {
    /// Key count per node. Members owning no keys appear with 0.
    pub counts: BTreeMap<NodeId, usize>,
    /// Total distinct keys counted.
    pub total: usize,
}

impl LoadDistribution {
    /// Resolve every key against `resolver` and count per owner. A repeated
    /// key is counted once.
    pub fn measure<I, R>(keys: I, resolver: &R) -> Result<Self, PlacementError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        R: Resolver + ?Sized,
    {
        let mut load = Self::empty(resolver.node_ids());
        let mut seen = HashSet::new();
        for key in keys {
            let key = key.as_ref();
            if !seen.insert(key.to_string()) {
                continue;
            }
            let owner = resolver.resolve(key)?;
            load.record(owner);
        }
        Ok(load)
    }

    /// Count per owner from an already captured snapshot.
    pub fn from_assignment(assignment: &Assignment, nodes: &[NodeId]) -> Self {
        let mut load = Self::empty(nodes.iter().cloned());
        for (_, owner) in assignment.iter() {
            load.record(owner.clone());
        }
        load
    }

    fn empty(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            counts: nodes.into_iter().map(|n| (n, 0)).collect(),
            total: 0,
        }
    }

    fn record(&mut self, owner: NodeId) {
        *self.counts.entry(owner).or_insert(0) += 1;
        self.total += 1;
    }

    /// Mean keys per node.
    pub fn mean(&self) -> f64 {
        if self.counts.is_empty() {
            0.0
        } else {
            self.total as f64 / self.counts.len() as f64
        }
    }

    /// Largest per-node count.
    pub fn max(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Smallest per-node count.
    pub fn min(&self) -> usize {
        self.counts.values().copied().min().unwrap_or(0)
    }

    /// `max / mean`: 1.0 is a perfect balance.
    pub fn imbalance(&self) -> f64 {
        let mean = self.mean();
        if mean == 0.0 {
            0.0
        } else {
            self.max() as f64 / mean
        }
    }
}
