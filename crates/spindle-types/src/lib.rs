//! Shared types and identifiers for Spindle.
//!
//! This crate defines the types passed between the placement library, the
//! simulation harness and the CLI: the node identifier ([`NodeId`]), the
//! topology deltas a scenario applies ([`TopologyChange`]), and ring
//! configuration ([`RingConfig`]).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ID types
// ---------------------------------------------------------------------------

/// Opaque identifier naming a physical destination (server, shard, cache).
///
/// Ordered by its string form so node lists can be sorted deterministically.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node identifier from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for NodeId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<[u8]> for NodeId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Build `count` node identifiers named `node-0`, `node-1`, ...
pub fn numbered_nodes(count: usize) -> Vec<NodeId> {
    (0..count).map(|i| NodeId(format!("node-{i}"))).collect()
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// A single change to the node set.
///
/// In TOML a change is written as an inline table: `{ add = "node-7" }` or
/// `{ remove = "node-3" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyChange {
    /// A node joins.
    Add(NodeId),
    /// A node leaves.
    Remove(NodeId),
}

impl TopologyChange {
    /// The node this change concerns.
    pub fn node(&self) -> &NodeId {
        match self {
            Self::Add(node) | Self::Remove(node) => node,
        }
    }
}

impl fmt::Display for TopologyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add(node) => write!(f, "add {node}"),
            Self::Remove(node) => write!(f, "remove {node}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default number of virtual nodes per physical node.
pub const DEFAULT_REPLICA_COUNT: u32 = 100;

/// Consistent hashing ring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Virtual nodes generated per physical node.
    pub replica_count: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replica_count: DEFAULT_REPLICA_COUNT,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
