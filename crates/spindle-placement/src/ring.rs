//! Consistent hashing ring implementation.

use std::collections::{BTreeMap, BTreeSet};

use spindle_types::NodeId;
use tracing::{debug, trace, warn};

use crate::Resolver;
use crate::error::PlacementError;
use crate::hasher::{Blake3Hasher, KeyHasher};

/// Maximum positions tried when a virtual node's hash collides.
pub const MAX_PROBES: u32 = 1024;

/// Size of the hash circle (`2^64`).
const CIRCLE: u128 = 1 << 64;

/// One position on the ring and the physical node that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNode {
    /// Position on the `u64` circle.
    pub position: u64,
    /// The physical node that owns this position.
    pub owner: NodeId,
}

/// Consistent hashing ring with virtual nodes.
///
/// Each member owns `replica_count` positions on the `u64` circle. A key is
/// owned by the first virtual node at or clockwise after the key's hash,
/// wrapping from the highest position back to the lowest.
///
/// Positions are unique. A virtual node whose hash is already taken is moved
/// to the next free position (linear probing, wrapping at `u64::MAX`), up to
/// [`MAX_PROBES`] attempts.
#[derive(Debug, Clone)]
pub struct Ring<H = Blake3Hasher> {
    /// Virtual nodes sorted by position.
    vnodes: Vec<VirtualNode>,
    /// Members and the number of virtual nodes each owns.
    members: BTreeMap<NodeId, u32>,
    /// Virtual nodes generated per member.
    replica_count: u32,
    hasher: H,
}

impl Ring<Blake3Hasher> {
    /// Create a ring over `nodes` using the default hasher.
    pub fn new(
        nodes: impl IntoIterator<Item = NodeId>,
        replica_count: u32,
    ) -> Result<Self, PlacementError> {
        Self::with_hasher(nodes, replica_count, Blake3Hasher)
    }
}

impl<H: KeyHasher> Ring<H> {
    /// Create a ring over `nodes` with an explicit hasher.
    ///
    /// Fails with [`PlacementError::InvalidReplicaCount`] if `replica_count`
    /// is zero and with [`PlacementError::DuplicateNode`] if a node is listed
    /// twice. An empty node list yields a valid ring that cannot resolve.
    pub fn with_hasher(
        nodes: impl IntoIterator<Item = NodeId>,
        replica_count: u32,
        hasher: H,
    ) -> Result<Self, PlacementError> {
        if replica_count == 0 {
            return Err(PlacementError::InvalidReplicaCount(replica_count));
        }

        let mut ring = Self {
            vnodes: Vec::new(),
            members: BTreeMap::new(),
            replica_count,
            hasher,
        };
        for node in nodes {
            ring.add_node(node)?;
        }
        Ok(ring)
    }

    /// Add a node and its virtual nodes.
    ///
    /// Fails with [`PlacementError::DuplicateNode`] if the node is already a
    /// member. All positions are computed before the ring is touched, so a
    /// failure leaves the ring unchanged.
    pub fn add_node(&mut self, node: NodeId) -> Result<(), PlacementError> {
        if self.members.contains_key(&node) {
            return Err(PlacementError::DuplicateNode(node));
        }

        let positions = self.place(&node)?;
        self.vnodes.extend(positions.into_iter().map(|position| VirtualNode {
            position,
            owner: node.clone(),
        }));
        self.vnodes.sort_unstable_by_key(|v| v.position);

        debug!(%node, replicas = self.replica_count, vnodes = self.vnodes.len(), "added node to ring");
        self.members.insert(node, self.replica_count);
        Ok(())
    }

    /// Remove a node and all of its virtual nodes.
    ///
    /// Removing the last node is allowed: the ring becomes empty and every
    /// resolve fails with [`PlacementError::EmptyTopology`].
    pub fn remove_node(&mut self, node: &NodeId) -> Result<(), PlacementError> {
        if self.members.remove(node).is_none() {
            return Err(PlacementError::NodeNotFound(node.clone()));
        }
        self.vnodes.retain(|v| &v.owner != node);
        debug!(%node, vnodes = self.vnodes.len(), "removed node from ring");
        Ok(())
    }

    /// Resolve a key to its owning node.
    pub fn resolve(&self, key: &str) -> Result<&NodeId, PlacementError> {
        let position = self.hasher.hash(key.as_bytes());
        let vnode = self.successor(position)?;
        trace!(
            key,
            position,
            vnode = vnode.position,
            node = %vnode.owner,
            "resolved key on ring"
        );
        Ok(&vnode.owner)
    }

    /// Return the first virtual node at or clockwise after `position`.
    ///
    /// Binary search over the sorted positions; a position past the highest
    /// virtual node wraps to the lowest one.
    pub fn successor(&self, position: u64) -> Result<&VirtualNode, PlacementError> {
        let index = self.vnodes.partition_point(|v| v.position < position);
        self.vnodes
            .get(index)
            .or_else(|| self.vnodes.first())
            .ok_or(PlacementError::EmptyTopology)
    }

    /// Fraction of the circle owned by each member.
    ///
    /// A virtual node owns the arc from its predecessor (exclusive) up to its
    /// own position (inclusive). The fractions sum to 1 for a non-empty ring.
    pub fn ownership(&self) -> BTreeMap<NodeId, f64> {
        let mut arcs: BTreeMap<NodeId, u128> =
            self.members.keys().map(|node| (node.clone(), 0)).collect();

        let mut previous = self.vnodes.last().map(|v| u128::from(v.position));
        for (i, vnode) in self.vnodes.iter().enumerate() {
            let position = u128::from(vnode.position);
            let start = previous.unwrap_or(position);
            let arc = if i == 0 {
                // Wraps across zero from the highest position.
                CIRCLE - start + position
            } else {
                position - start
            };
            if let Some(total) = arcs.get_mut(&vnode.owner) {
                *total += arc;
            }
            previous = Some(position);
        }

        arcs.into_iter()
            .map(|(node, arc)| (node, arc as f64 / CIRCLE as f64))
            .collect()
    }

    /// Whether `node` is a member.
    pub fn contains(&self, node: &NodeId) -> bool {
        self.members.contains_key(node)
    }

    /// Return the number of physical nodes in the ring.
    pub fn node_count(&self) -> usize {
        self.members.len()
    }

    /// Return the total number of vnodes in the ring.
    pub fn vnode_count(&self) -> usize {
        self.vnodes.len()
    }

    /// Virtual nodes generated per member.
    pub fn replica_count(&self) -> u32 {
        self.replica_count
    }

    /// Whether the ring has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Virtual nodes in ascending position order.
    pub fn positions(&self) -> &[VirtualNode] {
        &self.vnodes
    }

    /// Members in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.members.keys()
    }

    /// Compute free positions for every virtual node of `node`.
    fn place(&self, node: &NodeId) -> Result<BTreeSet<u64>, PlacementError> {
        let mut placed = BTreeSet::new();
        for index in 0..self.replica_count {
            let label = vnode_label(node, index);
            let start = self.hasher.hash(label.as_bytes());
            let position = self
                .probe(start, &placed)
                .ok_or_else(|| PlacementError::HashCollision {
                    label: label.clone(),
                    probes: MAX_PROBES,
                })?;
            if position != start {
                warn!(%label, start, position, "virtual node collided, probed to next free position");
            }
            placed.insert(position);
        }
        Ok(placed)
    }

    /// Find the first free position at or after `start`.
    fn probe(&self, start: u64, placed: &BTreeSet<u64>) -> Option<u64> {
        let mut position = start;
        for _ in 0..MAX_PROBES {
            let taken = placed.contains(&position)
                || self
                    .vnodes
                    .binary_search_by_key(&position, |v| v.position)
                    .is_ok();
            if !taken {
                return Some(position);
            }
            position = position.wrapping_add(1);
        }
        None
    }
}

impl<H: KeyHasher> Resolver for Ring<H> {
    fn resolve(&self, key: &str) -> Result<NodeId, PlacementError> {
        Ring::resolve(self, key).cloned()
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.members.keys().cloned().collect()
    }
}

/// Label hashed to place a node's `index`-th virtual node: `"{node}:{index}"`.
fn vnode_label(node: &NodeId, index: u32) -> String {
    format!("{node}:{index}")
}
