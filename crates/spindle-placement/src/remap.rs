//! Remap analysis: which keys changed owner between two topology states.
//!
//! Works the same for every [`Resolver`], so the modulo baseline and the
//! ring are compared over the same key universe and the same topology delta.

use std::collections::{HashMap, HashSet};

use spindle_types::NodeId;

use crate::Resolver;
use crate::error::PlacementError;

/// A key whose owner changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remap {
    /// The key that moved.
    pub key: String,
    /// Owner before the change.
    pub from: NodeId,
    /// Owner after the change.
    pub to: NodeId,
}

/// Result of comparing two assignments of the same key universe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapReport {
    /// Number of distinct keys compared.
    pub total: usize,
    /// Number of keys whose owner changed.
    pub count: usize,
    /// Every remapped key, in key-universe order.
    pub diffs: Vec<Remap>,
    /// Keys left without an owner on either side because that topology had
    /// no nodes. Not counted as remapped.
    pub unowned: usize,
}

impl RemapReport {
    /// Report for a change into or out of an empty topology: none of the
    /// `total` keys has an owner on both sides.
    pub fn unowned(total: usize) -> Self {
        Self {
            total,
            unowned: total,
            ..Self::default()
        }
    }

    /// Fraction of compared keys that moved (0 for an empty universe).
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count as f64 / self.total as f64
        }
    }

    /// The first `n` remapped keys.
    pub fn sample(&self, n: usize) -> &[Remap] {
        &self.diffs[..n.min(self.diffs.len())]
    }

    /// Number of keys that moved away from `node`.
    pub fn moved_from(&self, node: &NodeId) -> usize {
        self.diffs.iter().filter(|d| &d.from == node).count()
    }

    /// Number of keys that moved onto `node`.
    pub fn moved_to(&self, node: &NodeId) -> usize {
        self.diffs.iter().filter(|d| &d.to == node).count()
    }
}

/// A snapshot of key → node for a key universe.
///
/// Materialized explicitly so that a later topology change does not affect
/// it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    owners: HashMap<String, NodeId>,
}

impl Assignment {
    /// Resolve every key against `resolver`.
    ///
    /// Fails on the first key that cannot be resolved (e.g.
    /// [`PlacementError::EmptyTopology`]).
    pub fn capture<I, R>(keys: I, resolver: &R) -> Result<Self, PlacementError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        R: Resolver + ?Sized,
    {
        let owners = keys
            .into_iter()
            .map(|key| {
                let key = key.as_ref();
                resolver.resolve(key).map(|node| (key.to_string(), node))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { owners })
    }

    /// Owner of `key`, if the key was part of the captured universe.
    pub fn get(&self, key: &str) -> Option<&NodeId> {
        self.owners.get(key)
    }

    /// Number of keys in the snapshot.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether the snapshot holds no keys.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Iterate over `(key, owner)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeId)> {
        self.owners.iter().map(|(k, n)| (k.as_str(), n))
    }
}

impl FromIterator<(String, NodeId)> for Assignment {
    fn from_iter<T: IntoIterator<Item = (String, NodeId)>>(iter: T) -> Self {
        Self {
            owners: iter.into_iter().collect(),
        }
    }
}

/// Compare two snapshots over `keys`.
///
/// A key repeated in `keys` is compared once. Fails with
/// [`PlacementError::Unassigned`] if a key is missing from either snapshot.
pub fn compute_remapped<I>(
    keys: I,
    before: &Assignment,
    after: &Assignment,
) -> Result<RemapReport, PlacementError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut report = RemapReport::default();
    let mut seen = HashSet::new();
    for key in keys {
        let key = key.as_ref();
        if !seen.insert(key.to_string()) {
            continue;
        }
        let from = before
            .get(key)
            .ok_or_else(|| PlacementError::Unassigned(key.to_string()))?;
        let to = after
            .get(key)
            .ok_or_else(|| PlacementError::Unassigned(key.to_string()))?;

        report.total += 1;
        if from != to {
            report.count += 1;
            report.diffs.push(Remap {
                key: key.to_string(),
                from: from.clone(),
                to: to.clone(),
            });
        }
    }
    Ok(report)
}

/// Compare two resolvers directly over `keys`, each distinct key once.
pub fn compute_remapped_with<I, B, A>(
    keys: I,
    before: &B,
    after: &A,
) -> Result<RemapReport, PlacementError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    B: Resolver + ?Sized,
    A: Resolver + ?Sized,
{
    let mut report = RemapReport::default();
    let mut seen = HashSet::new();
    for key in keys {
        let key = key.as_ref();
        if !seen.insert(key.to_string()) {
            continue;
        }
        let from = before.resolve(key)?;
        let to = after.resolve(key)?;

        report.total += 1;
        if from != to {
            report.count += 1;
            report.diffs.push(Remap {
                key: key.to_string(),
                from,
                to,
            });
        }
    }
    Ok(report)
}
