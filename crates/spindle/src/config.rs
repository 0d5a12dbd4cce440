//! TOML configuration for the `spindle` CLI.
//!
//! Every section is optional. Without a config file the CLI runs the
//! reference scenario: 10 nodes, 100 virtual nodes each, 10 000 keys from
//! seed 42, and one step removing `node-9`.

use std::path::Path;

use serde::Deserialize;
use spindle_sim::{KeySpec, Scenario};
use spindle_types::{NodeId, RingConfig, TopologyChange, numbered_nodes};

/// Node count used when neither `nodes` nor `node_count` is configured.
const DEFAULT_NODE_COUNT: usize = 10;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Ring parameters.
    pub ring: RingConfig,
    /// Key universe.
    pub keys: KeySpec,
    /// Initial topology and scripted changes.
    pub scenario: ScenarioSection,
    /// Report output.
    pub report: ReportSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[scenario]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioSection {
    /// Explicit initial nodes. Takes precedence over `node_count`.
    pub nodes: Option<Vec<NodeId>>,
    /// Generate `node-0 .. node-{n-1}` when `nodes` is not set.
    pub node_count: Option<usize>,
    /// Changes applied in order, e.g. `[{ remove = "node-3" }]`.
    pub steps: Vec<TopologyChange>,
}

/// `[report]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Remapped keys listed per scheme and step.
    pub sample: usize,
    /// Number of seeds to run; more than 1 prints a trial summary.
    pub trials: u64,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            sample: 0,
            trials: 1,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective initial node set.
    pub fn nodes(&self) -> Vec<NodeId> {
        match &self.scenario.nodes {
            Some(nodes) => nodes.clone(),
            None => numbered_nodes(self.scenario.node_count.unwrap_or(DEFAULT_NODE_COUNT)),
        }
    }

    /// Effective steps: the configured ones, or removal of the last node.
    pub fn steps(&self) -> Vec<TopologyChange> {
        if !self.scenario.steps.is_empty() {
            return self.scenario.steps.clone();
        }
        self.nodes()
            .last()
            .map(|node| vec![TopologyChange::Remove(node.clone())])
            .unwrap_or_default()
    }

    /// Build the scenario described by this config.
    pub fn scenario(&self) -> Scenario {
        Scenario {
            nodes: self.nodes(),
            replica_count: self.ring.replica_count,
            steps: self.steps(),
        }
    }
}
