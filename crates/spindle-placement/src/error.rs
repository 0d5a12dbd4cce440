//! Error types for placement operations.

use spindle_types::NodeId;

/// Errors produced by the assigners, the ring and the remap analyzer.
///
/// Every mutation that returns an error leaves its target unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// There are no nodes to resolve a key against.
    #[error("empty topology: no nodes to resolve against")]
    EmptyTopology,

    /// A ring was created with a replica count of zero.
    #[error("invalid replica count {0}: must be at least 1")]
    InvalidReplicaCount(u32),

    /// The node is already a member.
    #[error("duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// The node is not a member.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Linear probing found no free ring position for a virtual node.
    ///
    /// With a 64-bit circle this only happens with a degenerate hasher, so it
    /// should be treated as a configuration error.
    #[error("hash collision: no free position for virtual node {label} after {probes} probes")]
    HashCollision {
        /// Label of the virtual node that could not be placed.
        label: String,
        /// Number of positions tried.
        probes: u32,
    },

    /// A key of the universe is missing from an assignment snapshot.
    #[error("key {0:?} has no entry in the assignment snapshot")]
    Unassigned(String),
}
