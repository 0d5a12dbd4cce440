//! Shared helpers for Spindle integration tests.
//!
//! Provides seeded key universes and the reference topologies the scenario
//! tests are built on.

use spindle_placement::Ring;
use spindle_sim::{KeySpec, generate_keys};
use spindle_types::{NodeId, numbered_nodes};

/// Seeds every statistical test runs under.
pub const SEEDS: [u64; 5] = [1, 7, 42, 1_234, 99_999];

/// Key universe size used by the remap-fraction tests.
pub const KEYS: usize = 10_000;

/// `count` keys generated from `seed`.
pub fn seeded_keys(count: usize, seed: u64) -> Vec<String> {
    generate_keys(&KeySpec {
        count,
        seed,
        prefix: "key".to_string(),
    })
}

/// `node-0 .. node-{count-1}`.
pub fn nodes(count: usize) -> Vec<NodeId> {
    numbered_nodes(count)
}

/// Build a ring over `count` numbered nodes.
pub fn ring(count: usize, replicas: u32) -> Ring {
    Ring::new(nodes(count), replicas).expect("valid ring")
}

/// Resolve every key, panicking on failure.
pub fn owners(ring: &Ring, keys: &[String]) -> Vec<NodeId> {
    keys.iter()
        .map(|k| ring.resolve(k).expect("non-empty ring").clone())
        .collect()
}
