//! Scenario results and their text rendering.

use std::fmt;

use spindle_placement::{LoadDistribution, RemapReport};
use spindle_types::TopologyChange;

/// Remaps and resulting load for one scheme after one step.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemeOutcome {
    /// Keys whose owner changed in this step.
    pub remap: RemapReport,
    /// Load after the step.
    pub load: LoadDistribution,
}

/// Outcome of one topology change, for both schemes.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// The change applied.
    pub change: TopologyChange,
    /// Node count before the change.
    pub nodes_before: usize,
    /// Node count after the change.
    pub nodes_after: usize,
    /// Modulo hashing baseline.
    pub modulo: SchemeOutcome,
    /// Consistent hashing ring.
    pub ring: SchemeOutcome,
}

impl StepReport {
    /// Keys a single-node change ideally moves: `K / N` with `N` the larger
    /// of the two node counts.
    pub fn expected_ring_remaps(&self) -> usize {
        let nodes = self.nodes_before.max(self.nodes_after);
        if nodes == 0 {
            0
        } else {
            self.ring.remap.total / nodes
        }
    }
}

/// Full result of a scenario run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    /// Number of distinct keys in the universe.
    pub keys: usize,
    /// Virtual nodes per physical node.
    pub replica_count: u32,
    /// Node count before any step.
    pub initial_nodes: usize,
    /// Load of the modulo scheme before any step.
    pub initial_modulo: LoadDistribution,
    /// Load of the ring before any step.
    pub initial_ring: LoadDistribution,
    /// One entry per topology change, in order.
    pub steps: Vec<StepReport>,
}

impl ScenarioReport {
    /// Render the report, listing up to `sample` remapped keys per scheme
    /// and step.
    pub fn render(&self, out: &mut impl fmt::Write, sample: usize) -> fmt::Result {
        writeln!(
            out,
            "Scenario: {} nodes, {} replicas per node, {} keys",
            self.initial_nodes, self.replica_count, self.keys
        )?;
        writeln!(
            out,
            "Initial load (max/mean): modulo {:.2}, ring {:.2}",
            self.initial_modulo.imbalance(),
            self.initial_ring.imbalance()
        )?;

        for (i, step) in self.steps.iter().enumerate() {
            writeln!(out)?;
            writeln!(
                out,
                "Step {}: {} ({} -> {} nodes)",
                i + 1,
                step.change,
                step.nodes_before,
                step.nodes_after
            )?;
            writeln!(
                out,
                "  {:<8} {:>10} {:>9} {:>10} {:>9}",
                "scheme", "remapped", "fraction", "expected", "max/mean"
            )?;
            write_scheme_row(out, "modulo", &step.modulo, None)?;
            write_scheme_row(out, "ring", &step.ring, Some(step.expected_ring_remaps()))?;
            if step.ring.remap.unowned > 0 {
                writeln!(
                    out,
                    "  no nodes on one side: {} keys unowned",
                    step.ring.remap.unowned
                )?;
            }

            if sample > 0 {
                for (name, outcome) in [("modulo", &step.modulo), ("ring", &step.ring)] {
                    let diffs = outcome.remap.sample(sample);
                    if diffs.is_empty() {
                        continue;
                    }
                    writeln!(out, "  sample {name} remaps:")?;
                    for diff in diffs {
                        writeln!(out, "    {}: {} -> {}", diff.key, diff.from, diff.to)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

fn write_scheme_row(
    out: &mut impl fmt::Write,
    name: &str,
    outcome: &SchemeOutcome,
    expected: Option<usize>,
) -> fmt::Result {
    let expected = expected.map(|e| e.to_string()).unwrap_or_default();
    writeln!(
        out,
        "  {:<8} {:>10} {:>8.2}% {:>10} {:>9.2}",
        name,
        outcome.remap.count,
        outcome.remap.fraction() * 100.0,
        expected,
        outcome.load.imbalance()
    )
}

/// Min / max / mean of a set of remap fractions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FractionStats {
    /// Smallest observed fraction.
    pub min: f64,
    /// Largest observed fraction.
    pub max: f64,
    /// Mean fraction.
    pub mean: f64,
}

impl FractionStats {
    /// Summarize `samples`; all zeros for an empty slice.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        Self { min, max, mean }
    }
}

/// Per-step remap statistics across seeds.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSummary {
    /// The change applied.
    pub change: TopologyChange,
    /// Modulo remap fractions.
    pub modulo: FractionStats,
    /// Ring remap fractions.
    pub ring: FractionStats,
}

/// Result of running one scenario under several seeds.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSummary {
    /// Seeds used, in order.
    pub seeds: Vec<u64>,
    /// Keys per trial.
    pub keys: usize,
    /// One entry per scenario step.
    pub steps: Vec<StepSummary>,
}

impl fmt::Display for TrialSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Trials: {} seeds, {} keys each",
            self.seeds.len(),
            self.keys
        )?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "Step {}: {}", i + 1, step.change)?;
            for (name, stats) in [("modulo", step.modulo), ("ring", step.ring)] {
                writeln!(
                    f,
                    "  {:<8} mean {:>6.2}%  min {:>6.2}%  max {:>6.2}%",
                    name,
                    stats.mean * 100.0,
                    stats.min * 100.0,
                    stats.max * 100.0
                )?;
            }
        }
        Ok(())
    }
}
