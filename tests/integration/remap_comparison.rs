//! Integration test: remap counts of the ring versus the modulo baseline.
//!
//! Every statistical bound is checked under several seeds, not a single one.

use spindle_placement::{ModuloAssigner, compute_remapped_with};
use spindle_sim::{KeySpec, Scenario, run_trials};
use spindle_types::{NodeId, TopologyChange};

use spindle_integration_tests::{KEYS, SEEDS, nodes, ring, seeded_keys};

/// 10 -> 9 nodes with 32 replicas: the ring moves at most 3K/N keys, modulo
/// moves close to K(N-1)/N.
#[test]
fn test_remove_one_of_ten_nodes() {
    let n = 10;
    for seed in SEEDS {
        let keys = seeded_keys(KEYS, seed);
        let scenario =
            Scenario::new(nodes(n), 32).then(TopologyChange::Remove(NodeId::from("node-6")));
        let report = scenario.run(&keys).unwrap();
        let step = &report.steps[0];

        assert!(
            step.ring.remap.count <= 3 * KEYS / n,
            "seed {seed}: ring remapped {}",
            step.ring.remap.count
        );
        let modulo = step.modulo.remap.count;
        assert!(
            (8_700..=9_300).contains(&modulo),
            "seed {seed}: modulo remapped {modulo}, expected about {}",
            KEYS * (n - 1) / n
        );
        assert!(modulo > 3 * step.ring.remap.count);
    }
}

/// 10 -> 11 nodes: the new node takes roughly 1/11 of the keys, all of
/// which are the only ring remaps.
#[test]
fn test_add_eleventh_node() {
    let new_node = NodeId::from("node-10");
    for seed in SEEDS {
        let keys = seeded_keys(KEYS, seed);
        let before = ring(10, 100);
        let mut after = before.clone();
        after.add_node(new_node.clone()).unwrap();

        let report = compute_remapped_with(&keys, &before, &after).unwrap();
        assert_eq!(report.moved_to(&new_node), report.count, "seed {seed}");
        assert!(report.count <= 3 * KEYS / 11, "seed {seed}: {}", report.count);
        assert!(report.count >= KEYS / 33, "seed {seed}: {}", report.count);

        let modulo_before = ModuloAssigner::new(nodes(10)).unwrap();
        let mut modulo_after = modulo_before.clone();
        modulo_after.add_node(new_node.clone()).unwrap();
        let modulo = compute_remapped_with(&keys, &modulo_before, &modulo_after).unwrap();
        assert!(modulo.fraction() > 0.85, "seed {seed}: {:.3}", modulo.fraction());
    }
}

/// Three nodes gain a fourth: the ring moves about a quarter of the keys,
/// modulo about three quarters.
#[test]
fn test_three_to_four_nodes() {
    let scenario = Scenario::new(
        vec![NodeId::from("A"), NodeId::from("B"), NodeId::from("C")],
        100,
    )
    .then(TopologyChange::Add(NodeId::from("D")));

    let summary = run_trials(
        &scenario,
        &KeySpec {
            count: KEYS,
            ..KeySpec::default()
        },
        SEEDS,
    )
    .unwrap();

    let step = &summary.steps[0];
    assert!(
        (0.12..=0.40).contains(&step.ring.mean),
        "ring mean {:.3}",
        step.ring.mean
    );
    assert!(
        (0.70..=0.80).contains(&step.modulo.mean),
        "modulo mean {:.3}",
        step.modulo.mean
    );
}

/// A scripted sequence: every ring step stays near K/N while modulo keeps
/// reshuffling.
#[test]
fn test_scripted_sequence() {
    let scenario = Scenario::new(nodes(8), 64)
        .then(TopologyChange::Remove(NodeId::from("node-3")))
        .then(TopologyChange::Add(NodeId::from("node-8")))
        .then(TopologyChange::Add(NodeId::from("node-9")))
        .then(TopologyChange::Remove(NodeId::from("node-0")));

    for seed in SEEDS {
        let keys = seeded_keys(5_000, seed);
        let report = scenario.run(&keys).unwrap();
        assert_eq!(report.steps.len(), 4);

        for step in &report.steps {
            let bound = 3 * step.expected_ring_remaps();
            assert!(
                step.ring.remap.count <= bound,
                "seed {seed}, {}: ring {} > {bound}",
                step.change,
                step.ring.remap.count
            );
            assert!(
                step.modulo.remap.count > 2 * step.ring.remap.count,
                "seed {seed}, {}: modulo {} vs ring {}",
                step.change,
                step.modulo.remap.count,
                step.ring.remap.count
            );
        }
        assert_eq!(report.steps.last().unwrap().nodes_after, 8);
    }
}

/// Report text carries both schemes for every step.
#[test]
fn test_rendered_report() {
    let scenario = Scenario::new(nodes(10), 100).then(TopologyChange::Remove(NodeId::from("node-9")));
    let report = scenario.run(&seeded_keys(1_000, 42)).unwrap();

    let mut text = String::new();
    report.render(&mut text, 2).unwrap();
    assert!(text.contains("Step 1: remove node-9 (10 -> 9 nodes)"));
    assert!(text.contains("modulo"));
    assert!(text.contains("sample ring remaps:"));
    assert!(text.contains("node-9 -> "));
}
