//! Integration test: concurrent readers against a copy-on-write ring while a
//! single writer changes the topology.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use spindle_placement::{PlacementError, Resolver, SharedRing};
use spindle_types::NodeId;

use spindle_integration_tests::{nodes, ring, seeded_keys};

/// Readers resolve against snapshots and never observe a half-applied
/// change: every owner they see is a member of the snapshot they used.
#[test]
fn test_readers_see_consistent_snapshots() {
    let shared = Arc::new(SharedRing::new(ring(8, 64)));
    let done = Arc::new(AtomicBool::new(false));
    let keys = Arc::new(seeded_keys(2_000, 21));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            let done = Arc::clone(&done);
            let keys = Arc::clone(&keys);
            thread::spawn(move || {
                let mut resolved = 0usize;
                while !done.load(Ordering::Acquire) {
                    let snapshot = shared.snapshot();
                    let members: Vec<NodeId> = snapshot.nodes().cloned().collect();
                    for key in keys.iter().take(200) {
                        let owner = snapshot.resolve(key).unwrap();
                        assert!(members.contains(owner), "{owner} not in snapshot");
                        assert_eq!(snapshot.resolve(key).unwrap(), owner);
                    }
                    resolved += 200;
                }
                resolved
            })
        })
        .collect();

    for i in 8..16 {
        shared.add_node(NodeId::new(format!("node-{i}"))).unwrap();
    }
    for node in nodes(8) {
        shared.remove_node(&node).unwrap();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().unwrap();
    }

    let final_ring = shared.snapshot();
    let mut expected: Vec<NodeId> = (8..16).map(|i| NodeId::new(format!("node-{i}"))).collect();
    expected.sort();
    assert_eq!(final_ring.nodes().cloned().collect::<Vec<_>>(), expected);
    assert_eq!(final_ring.vnode_count(), 8 * 64);
}

/// Snapshots taken before a change keep resolving the old topology.
#[test]
fn test_old_snapshot_survives_removal_of_all_nodes() {
    let shared = SharedRing::new(ring(3, 16));
    let old = shared.snapshot();
    let keys = seeded_keys(100, 2);
    let expected: Vec<NodeId> = keys.iter().map(|k| old.resolve(k).unwrap().clone()).collect();

    for node in nodes(3) {
        shared.remove_node(&node).unwrap();
    }

    assert_eq!(shared.resolve(&keys[0]), Err(PlacementError::EmptyTopology));
    for (key, owner) in keys.iter().zip(&expected) {
        assert_eq!(old.resolve(key).unwrap(), owner);
    }
}

/// Reader handles answer from whole snapshots throughout a run of writes and
/// end up on the final topology.
#[test]
fn test_reader_handles_follow_writer() {
    let shared = SharedRing::new(ring(4, 32));
    let keys = seeded_keys(500, 9);
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        for _ in 0..3 {
            s.spawn(|| {
                let mut reader = shared.reader();
                while !done.load(Ordering::Acquire) {
                    let snapshot = Arc::clone(reader.snapshot());
                    for key in keys.iter().take(50) {
                        let owner = snapshot.resolve(key).unwrap();
                        assert!(snapshot.contains(owner));
                    }
                }
                let last = Arc::clone(reader.snapshot());
                assert_eq!(last.node_count(), 8);
            });
        }

        for i in 4..8 {
            shared.add_node(NodeId::new(format!("node-{i}"))).unwrap();
        }
        done.store(true, Ordering::Release);
    });

    assert_eq!(shared.generation(), 4);
}
