//! Integration test: ring behavior across topology changes at realistic
//! scale (hundreds of nodes, thousands of virtual nodes).

use spindle_placement::{Assignment, PlacementError, Ring, compute_remapped};
use spindle_types::NodeId;

use spindle_integration_tests::{SEEDS, nodes, owners, ring, seeded_keys};

fn abc() -> Vec<NodeId> {
    vec![NodeId::from("A"), NodeId::from("B"), NodeId::from("C")]
}

/// Removing B from {A, B, C}: A's and C's keys stay put, B's keys land on
/// A or C.
#[test]
fn test_unaffected_nodes_keep_their_keys() {
    let b = NodeId::from("B");
    for seed in SEEDS {
        let keys = seeded_keys(5_000, seed);
        let mut ring = Ring::new(abc(), 64).unwrap();
        let before = owners(&ring, &keys);

        ring.remove_node(&b).unwrap();
        let after = owners(&ring, &keys);

        for (old, new) in before.iter().zip(&after) {
            if *old == b {
                assert_ne!(*new, b);
            } else {
                assert_eq!(old, new, "seed {seed}");
            }
        }
    }
}

/// Resolution never fails with nodes present and always fails without.
#[test]
fn test_resolve_fails_only_on_empty_ring() {
    let keys = seeded_keys(1_000, 3);
    let mut ring = ring(3, 16);
    for key in &keys {
        assert!(ring.resolve(key).is_ok());
    }

    for node in nodes(3) {
        ring.remove_node(&node).unwrap();
    }
    for key in &keys {
        assert_eq!(ring.resolve(key), Err(PlacementError::EmptyTopology));
    }
}

/// Remove then re-add restores every key, including the removed node's.
#[test]
fn test_remove_add_round_trip() {
    for seed in SEEDS {
        let keys = seeded_keys(5_000, seed);
        let mut ring = ring(20, 50);
        let before = Assignment::capture(&keys, &ring).unwrap();

        let victim = NodeId::from("node-13");
        ring.remove_node(&victim).unwrap();
        ring.add_node(victim).unwrap();

        let after = Assignment::capture(&keys, &ring).unwrap();
        let report = compute_remapped(&keys, &before, &after).unwrap();
        assert_eq!(report.count, 0, "seed {seed}");
    }
}

/// A rejected duplicate add changes nothing.
#[test]
fn test_duplicate_add_is_idempotent() {
    let keys = seeded_keys(2_000, 11);
    let mut ring = ring(5, 40);
    let before = Assignment::capture(&keys, &ring).unwrap();

    assert_eq!(
        ring.add_node(NodeId::from("node-2")),
        Err(PlacementError::DuplicateNode(NodeId::from("node-2")))
    );
    assert_eq!(ring.vnode_count(), 200);

    let after = Assignment::capture(&keys, &ring).unwrap();
    assert_eq!(before, after);
}

/// Large ring: 300 nodes x 50 replicas stays sorted, balanced, and only
/// moves the departing node's keys.
#[test]
fn test_large_ring() {
    let mut ring = ring(300, 50);
    assert_eq!(ring.vnode_count(), 15_000);
    assert!(
        ring.positions()
            .windows(2)
            .all(|w| w[0].position < w[1].position)
    );

    let shares = ring.ownership();
    let max = shares.values().copied().fold(0.0, f64::max);
    assert!(max < 3.0 / 300.0, "largest share {max:.5}");

    let keys = seeded_keys(30_000, 5);
    let before = owners(&ring, &keys);
    let victim = NodeId::from("node-150");
    ring.remove_node(&victim).unwrap();
    let after = owners(&ring, &keys);

    let moved = before.iter().zip(&after).filter(|(b, a)| b != a).count();
    let owned = before.iter().filter(|b| **b == victim).count();
    assert_eq!(moved, owned);
}

/// A key hashing past the last virtual node belongs to the first one.
#[test]
fn test_wrap_around_to_lowest_position() {
    let ring = ring(4, 8);
    let last = ring.positions().last().unwrap().position;
    let first = ring.positions().first().unwrap().owner.clone();

    let key = (0u64..)
        .map(|i| format!("wrap-{i}"))
        .find(|k| spindle_placement::hash(k.as_bytes()) > last)
        .unwrap();
    assert_eq!(ring.resolve(&key).unwrap(), &first);
    assert_eq!(ring.successor(last).unwrap().position, last);
    if last < u64::MAX {
        assert_eq!(ring.successor(last + 1).unwrap().owner, first);
    }
}
