//! Key placement: modulo hashing and a consistent hashing ring.
//!
//! This crate provides:
//! - [`KeyHasher`] / [`Blake3Hasher`]: deterministic hash onto the `u64` circle.
//! - [`ModuloAssigner`]: the `hash(key) mod N` baseline.
//! - [`Ring`]: a consistent hashing ring with virtual nodes.
//! - [`SharedRing`] / [`RingReader`]: copy-on-write ring snapshots for
//!   concurrent readers.
//! - [`compute_remapped`]: diffs two assignment snapshots of a key universe.
//! - [`LoadDistribution`]: per-node key counts and imbalance.
//!
//! Each physical node gets `replica_count` positions on the ring, placed at
//! `hash("{node}:{index}")`. A key resolves to the first virtual node at or
//! clockwise after `hash(key)`, wrapping past the top of the circle.

mod distribution;
mod error;
mod hasher;
mod modulo;
mod remap;
mod ring;
mod shared;

pub use distribution::LoadDistribution;
pub use error::PlacementError;
pub use hasher::{Blake3Hasher, KeyHasher, hash};
pub use modulo::{ModuloAssigner, assign};
pub use remap::{Assignment, Remap, RemapReport, compute_remapped, compute_remapped_with};
pub use ring::{MAX_PROBES, Ring, VirtualNode};
pub use shared::{RingReader, SharedRing};

use spindle_types::NodeId;

/// Anything that maps a key to its owning node.
///
/// Implemented by both schemes so the remap analyzer and the load
/// distribution treat them identically.
pub trait Resolver {
    /// Resolve `key` to the node that owns it.
    fn resolve(&self, key: &str) -> Result<NodeId, PlacementError>;

    /// Current members, sorted by identifier.
    fn node_ids(&self) -> Vec<NodeId>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve(&self, key: &str) -> Result<NodeId, PlacementError> {
        (**self).resolve(key)
    }

    fn node_ids(&self) -> Vec<NodeId> {
        (**self).node_ids()
    }
}
