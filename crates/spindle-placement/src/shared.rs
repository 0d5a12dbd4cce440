//! Copy-on-write ring for concurrent readers.
//!
//! Readers take an `Arc` snapshot and resolve against it without holding any
//! lock. Writers are serialized: each clones the current ring, applies its
//! mutation to the clone, and swaps the result in. A mutation that fails is
//! never published.
//!
//! [`SharedRing::snapshot`] may wait out a swap in progress. A [`RingReader`]
//! never does: it checks a generation counter and, if the swap lock is busy,
//! keeps answering from the snapshot it already holds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, TryLockError};

use spindle_types::NodeId;
use tracing::debug;

use crate::Resolver;
use crate::error::PlacementError;
use crate::hasher::{Blake3Hasher, KeyHasher};
use crate::ring::Ring;

/// A [`Ring`] shared between many readers and a single logical writer.
#[derive(Debug)]
pub struct SharedRing<H = Blake3Hasher> {
    /// The published snapshot. Only held long enough to clone or swap the `Arc`.
    current: RwLock<Arc<Ring<H>>>,
    /// Bumped under the write lock each time a snapshot is published.
    generation: AtomicU64,
    /// Serializes writers so concurrent mutations are not lost.
    writer: Mutex<()>,
}

impl<H: KeyHasher + Clone> SharedRing<H> {
    /// Publish `ring` as the initial snapshot.
    pub fn new(ring: Ring<H>) -> Self {
        Self {
            current: RwLock::new(Arc::new(ring)),
            generation: AtomicU64::new(0),
            writer: Mutex::new(()),
        }
    }

    /// Return the current snapshot.
    ///
    /// The snapshot stays valid and unchanged while later mutations publish
    /// newer ones.
    pub fn snapshot(&self) -> Arc<Ring<H>> {
        Arc::clone(&self.current.read().expect("lock poisoned"))
    }

    /// A reader handle that never blocks on writers.
    pub fn reader(&self) -> RingReader<'_, H> {
        let generation = self.generation.load(Ordering::Acquire);
        RingReader {
            shared: self,
            cached: self.snapshot(),
            generation,
        }
    }

    /// Number of snapshots published since creation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Add a node, publishing a new snapshot on success.
    pub fn add_node(&self, node: NodeId) -> Result<(), PlacementError> {
        self.update(|ring| ring.add_node(node))
    }

    /// Remove a node, publishing a new snapshot on success.
    pub fn remove_node(&self, node: &NodeId) -> Result<(), PlacementError> {
        self.update(|ring| ring.remove_node(node))
    }

    fn update<F>(&self, mutate: F) -> Result<(), PlacementError>
    where
        F: FnOnce(&mut Ring<H>) -> Result<(), PlacementError>,
    {
        let _guard = self.writer.lock().expect("lock poisoned");
        let mut next: Ring<H> = (*self.snapshot()).clone();
        mutate(&mut next)?;

        let vnodes = next.vnode_count();
        let mut current = self.current.write().expect("lock poisoned");
        *current = Arc::new(next);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        drop(current);
        debug!(vnodes, generation, "published ring snapshot");
        Ok(())
    }
}

/// Per-thread view of a [`SharedRing`] that never waits on the writer.
///
/// Holds the last snapshot it saw. [`RingReader::snapshot`] refreshes it only
/// when a newer one was published and the swap lock is free, so a reader may
/// answer from the previous topology for the duration of a swap.
#[derive(Debug)]
pub struct RingReader<'a, H = Blake3Hasher> {
    shared: &'a SharedRing<H>,
    cached: Arc<Ring<H>>,
    generation: u64,
}

impl<H: KeyHasher + Clone> RingReader<'_, H> {
    /// Latest snapshot obtainable without blocking.
    pub fn snapshot(&mut self) -> &Arc<Ring<H>> {
        let latest = self.shared.generation.load(Ordering::Acquire);
        if latest != self.generation {
            match self.shared.current.try_read() {
                Ok(current) => {
                    self.cached = Arc::clone(&current);
                    self.generation = latest;
                }
                Err(TryLockError::WouldBlock) => {}
                Err(TryLockError::Poisoned(_)) => panic!("lock poisoned"),
            }
        }
        &self.cached
    }

    /// Resolve `key` against [`RingReader::snapshot`].
    pub fn resolve(&mut self, key: &str) -> Result<NodeId, PlacementError> {
        self.snapshot().resolve(key).cloned()
    }
}

impl<H: KeyHasher + Clone> Resolver for SharedRing<H> {
    fn resolve(&self, key: &str) -> Result<NodeId, PlacementError> {
        self.snapshot().resolve(key).cloned()
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.snapshot().nodes().cloned().collect()
    }
}
