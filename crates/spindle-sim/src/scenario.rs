//! Scripted topology changes applied to both schemes side by side.

use std::collections::HashSet;

use spindle_placement::{
    Assignment, LoadDistribution, ModuloAssigner, PlacementError, RemapReport, Resolver, Ring,
    compute_remapped,
};
use spindle_types::{NodeId, TopologyChange};
use tracing::{debug, info, warn};

use crate::error::SimError;
use crate::keys::{KeySpec, generate_keys};
use crate::report::{
    FractionStats, ScenarioReport, SchemeOutcome, StepReport, StepSummary, TrialSummary,
};

/// An initial node set and the changes applied to it, in order.
///
/// Changes are cumulative: each step starts from the topology the previous
/// step left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Nodes present before the first step.
    pub nodes: Vec<NodeId>,
    /// Virtual nodes per physical node on the ring.
    pub replica_count: u32,
    /// Topology changes.
    pub steps: Vec<TopologyChange>,
}

impl Scenario {
    /// Scenario with no steps yet.
    pub fn new(nodes: Vec<NodeId>, replica_count: u32) -> Self {
        Self {
            nodes,
            replica_count,
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn then(mut self, change: TopologyChange) -> Self {
        self.steps.push(change);
        self
    }

    /// Run every step against `keys` for both schemes.
    ///
    /// A key repeated in `keys` is counted once. Fails if the initial
    /// topology cannot resolve (no nodes, zero replicas) or if a step is
    /// rejected (duplicate add, unknown remove). A step that leaves no nodes
    /// is recorded with every key unowned, and later steps carry on from the
    /// empty topology.
    pub fn run(&self, keys: &[String]) -> Result<ScenarioReport, SimError> {
        let keys = distinct(keys);
        let mut ring = Ring::new(self.nodes.iter().cloned(), self.replica_count)?;
        let mut modulo = ModuloAssigner::new(self.nodes.iter().cloned())?;

        let ring_initial = Assignment::capture(&keys, &ring)?;
        let modulo_initial = Assignment::capture(&keys, &modulo)?;

        let initial_ring = LoadDistribution::from_assignment(&ring_initial, &ring.node_ids());
        let initial_modulo = LoadDistribution::from_assignment(&modulo_initial, modulo.nodes());
        info!(
            nodes = self.nodes.len(),
            replicas = self.replica_count,
            keys = keys.len(),
            "starting scenario"
        );

        let mut ring_before = Some(ring_initial);
        let mut modulo_before = Some(modulo_initial);
        let mut steps = Vec::with_capacity(self.steps.len());
        for change in &self.steps {
            let nodes_before = ring.node_count();
            apply(change, &mut ring, &mut modulo)?;

            let ring_after = capture(&keys, &ring)?;
            let modulo_after = capture(&keys, &modulo)?;
            if ring_after.is_none() {
                warn!(%change, keys = keys.len(), "no nodes left, keys are unowned");
            }

            let step = StepReport {
                change: change.clone(),
                nodes_before,
                nodes_after: ring.node_count(),
                modulo: outcome(
                    &keys,
                    modulo_before.as_ref(),
                    modulo_after.as_ref(),
                    modulo.nodes(),
                )?,
                ring: outcome(
                    &keys,
                    ring_before.as_ref(),
                    ring_after.as_ref(),
                    &ring.node_ids(),
                )?,
            };
            info!(
                %change,
                modulo_remapped = step.modulo.remap.count,
                ring_remapped = step.ring.remap.count,
                "applied topology change"
            );
            steps.push(step);

            ring_before = ring_after;
            modulo_before = modulo_after;
        }

        Ok(ScenarioReport {
            keys: keys.len(),
            replica_count: self.replica_count,
            initial_nodes: self.nodes.len(),
            initial_modulo,
            initial_ring,
            steps,
        })
    }
}

/// `keys` without repeats, in first-seen order.
fn distinct(keys: &[String]) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.iter()
        .map(String::as_str)
        .filter(|key| seen.insert(*key))
        .collect()
}

/// Snapshot of `keys`, or `None` when the topology has no nodes.
fn capture<R: Resolver>(
    keys: &[&str],
    resolver: &R,
) -> Result<Option<Assignment>, PlacementError> {
    match Assignment::capture(keys, resolver) {
        Ok(assignment) => Ok(Some(assignment)),
        Err(PlacementError::EmptyTopology) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Remaps and load for one scheme. Either side being empty leaves every key
/// unowned rather than remapped.
fn outcome(
    keys: &[&str],
    before: Option<&Assignment>,
    after: Option<&Assignment>,
    nodes: &[NodeId],
) -> Result<SchemeOutcome, PlacementError> {
    let remap = match (before, after) {
        (Some(before), Some(after)) => compute_remapped(keys, before, after)?,
        _ => RemapReport::unowned(keys.len()),
    };
    let load = match after {
        Some(after) => LoadDistribution::from_assignment(after, nodes),
        None => LoadDistribution::default(),
    };
    Ok(SchemeOutcome { remap, load })
}

/// Apply one change to both schemes. The ring goes first so a rejected change
/// leaves both untouched.
fn apply(
    change: &TopologyChange,
    ring: &mut Ring,
    modulo: &mut ModuloAssigner,
) -> Result<(), SimError> {
    match change {
        TopologyChange::Add(node) => {
            ring.add_node(node.clone())?;
            modulo.add_node(node.clone())?;
        }
        TopologyChange::Remove(node) => {
            ring.remove_node(node)?;
            modulo.remove_node(node)?;
        }
    }
    debug!(%change, nodes = ring.node_count(), "topology updated");
    Ok(())
}

/// Run `scenario` once per seed, each with a fresh key universe.
pub fn run_trials(
    scenario: &Scenario,
    keys: &KeySpec,
    seeds: impl IntoIterator<Item = u64>,
) -> Result<TrialSummary, SimError> {
    let seeds: Vec<u64> = seeds.into_iter().collect();
    if seeds.is_empty() {
        return Err(SimError::NoSeeds);
    }

    let mut modulo_fractions = vec![Vec::with_capacity(seeds.len()); scenario.steps.len()];
    let mut ring_fractions = vec![Vec::with_capacity(seeds.len()); scenario.steps.len()];

    for &seed in &seeds {
        let universe = generate_keys(&keys.with_seed(seed));
        let report = scenario.run(&universe)?;
        for (i, step) in report.steps.iter().enumerate() {
            modulo_fractions[i].push(step.modulo.remap.fraction());
            ring_fractions[i].push(step.ring.remap.fraction());
        }
        debug!(seed, "trial finished");
    }

    let steps = scenario
        .steps
        .iter()
        .zip(modulo_fractions.iter().zip(&ring_fractions))
        .map(|(change, (modulo, ring))| StepSummary {
            change: change.clone(),
            modulo: FractionStats::from_samples(modulo),
            ring: FractionStats::from_samples(ring),
        })
        .collect();

    Ok(TrialSummary {
        seeds,
        keys: keys.count,
        steps,
    })
}
