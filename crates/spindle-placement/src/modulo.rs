//! Modulo hashing baseline.
//!
//! A key goes to `nodes[hash(key) % nodes.len()]`. Changing the node count
//! changes the divisor, so most keys move even when the changed node owned
//! none of them. It exists to be compared against [`Ring`](crate::Ring).

use spindle_types::NodeId;
use tracing::{debug, trace};

use crate::Resolver;
use crate::error::PlacementError;
use crate::hasher::{Blake3Hasher, KeyHasher};

/// Assign `key` to one of `ordered_nodes` by `hash(key) mod len`.
///
/// The caller is responsible for passing the nodes in the same order on
/// every call (e.g. sorted by identifier), otherwise successive assignments
/// are not comparable.
pub fn assign<'a, H: KeyHasher + ?Sized>(
    hasher: &H,
    key: &str,
    ordered_nodes: &'a [NodeId],
) -> Result<&'a NodeId, PlacementError> {
    if ordered_nodes.is_empty() {
        return Err(PlacementError::EmptyTopology);
    }
    let index = (hasher.hash(key.as_bytes()) % ordered_nodes.len() as u64) as usize;
    let node = &ordered_nodes[index];
    trace!(key, index, %node, "assigned key by modulo");
    Ok(node)
}

/// Stateful modulo assigner over a node list kept sorted by identifier.
#[derive(Debug, Clone)]
pub struct ModuloAssigner<H = Blake3Hasher> {
    /// Members, sorted and unique.
    nodes: Vec<NodeId>,
    hasher: H,
}

impl ModuloAssigner<Blake3Hasher> {
    /// Create an assigner over `nodes` using the default hasher.
    pub fn new(nodes: impl IntoIterator<Item = NodeId>) -> Result<Self, PlacementError> {
        Self::with_hasher(nodes, Blake3Hasher)
    }
}

impl<H: KeyHasher> ModuloAssigner<H> {
    /// Create an assigner over `nodes` with an explicit hasher.
    ///
    /// Fails with [`PlacementError::DuplicateNode`] if a node is listed twice.
    /// An empty node list is accepted; assignments then fail with
    /// [`PlacementError::EmptyTopology`].
    pub fn with_hasher(
        nodes: impl IntoIterator<Item = NodeId>,
        hasher: H,
    ) -> Result<Self, PlacementError> {
        let mut assigner = Self {
            nodes: Vec::new(),
            hasher,
        };
        for node in nodes {
            assigner.add_node(node)?;
        }
        Ok(assigner)
    }

    /// Assign a key to a node.
    pub fn assign(&self, key: &str) -> Result<&NodeId, PlacementError> {
        assign(&self.hasher, key, &self.nodes)
    }

    /// Add a node, keeping the list sorted.
    pub fn add_node(&mut self, node: NodeId) -> Result<(), PlacementError> {
        match self.nodes.binary_search(&node) {
            Ok(_) => Err(PlacementError::DuplicateNode(node)),
            Err(index) => {
                debug!(%node, index, "added node to modulo assigner");
                self.nodes.insert(index, node);
                Ok(())
            }
        }
    }

    /// Remove a node.
    pub fn remove_node(&mut self, node: &NodeId) -> Result<(), PlacementError> {
        match self.nodes.binary_search(node) {
            Ok(index) => {
                self.nodes.remove(index);
                debug!(%node, "removed node from modulo assigner");
                Ok(())
            }
            Err(_) => Err(PlacementError::NodeNotFound(node.clone())),
        }
    }

    /// The sorted node list keys are assigned into.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Return the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl<H: KeyHasher> Resolver for ModuloAssigner<H> {
    fn resolve(&self, key: &str) -> Result<NodeId, PlacementError> {
        self.assign(key).cloned()
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.clone()
    }
}
