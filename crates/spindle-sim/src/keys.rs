//! Reproducible key universes.
//!
//! Keys are seeded pseudorandom `u64` values rendered as
//! `"{prefix}-{value:016x}"`. The same `KeySpec` always yields the same keys in
//! the same order, so remap counts are reproducible across runs.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// Parameters for generating a key universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySpec {
    /// Number of distinct keys.
    pub count: usize,
    /// Seed for the generator.
    pub seed: u64,
    /// Prefix prepended to every key.
    pub prefix: String,
}

impl Default for KeySpec {
    fn default() -> Self {
        Self {
            count: 10_000,
            seed: 42,
            prefix: "key".to_string(),
        }
    }
}

impl KeySpec {
    /// Copy of these settings with a different seed.
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }
}

/// Generate `spec.count` distinct keys.
pub fn generate_keys(spec: &KeySpec) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let mut seen = HashSet::with_capacity(spec.count);
    let mut keys = Vec::with_capacity(spec.count);

    while keys.len() < spec.count {
        let value = rng.next_u64();
        if seen.insert(value) {
            keys.push(format!("{}-{value:016x}", spec.prefix));
        }
    }
    keys
}
