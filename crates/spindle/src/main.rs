//! `spindle`: compare key remapping under modulo and consistent hashing.
//!
//! # Usage
//!
//! ```text
//! spindle simulate                              # reference scenario (10 -> 9 nodes)
//! spindle simulate -c spindle.toml              # scenario from a config file
//! spindle simulate -n 5 -s remove:node-2 -s add:node-7
//! spindle simulate -n 5 --remove node-2 --add node-7    # same steps
//! spindle simulate --trials 10                  # repeat across 10 seeds
//! spindle resolve user_1 user_2 -n 4            # owner of each key under both schemes
//! spindle ring -n 8 -r 50                       # ring statistics and ownership
//! ```

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use spindle_placement::{ModuloAssigner, Ring};
use spindle_sim::{generate_keys, run_trials};
use spindle_types::{TopologyChange, numbered_nodes};
use tracing::info;

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "spindle",
    version,
    about = "Compare key remapping under modulo hashing and consistent hashing"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Topology overrides shared by every subcommand.
#[derive(Args, Debug)]
struct TopologyArgs {
    /// Use `node-0 .. node-{N-1}` as the initial nodes.
    #[arg(short = 'n', long)]
    nodes: Option<usize>,

    /// Virtual nodes per physical node.
    #[arg(short, long)]
    replicas: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and report remapped keys for both schemes.
    Simulate {
        #[command(flatten)]
        topology: TopologyArgs,

        /// Size of the key universe.
        #[arg(short, long)]
        keys: Option<usize>,

        /// Seed for key generation (first seed when running trials).
        #[arg(long)]
        seed: Option<u64>,

        /// Topology change, `add:<node>` or `remove:<node>`. Repeatable;
        /// replaces the configured steps.
        #[arg(short, long = "step", value_parser = parse_step)]
        steps: Vec<TopologyChange>,

        /// Add a node, as `--step add:<node>`. Repeatable.
        #[arg(long, value_name = "NODE")]
        add: Vec<String>,

        /// Remove a node, as `--step remove:<node>`. Repeatable.
        #[arg(long, value_name = "NODE")]
        remove: Vec<String>,

        /// Number of seeds to run.
        #[arg(short, long)]
        trials: Option<u64>,

        /// Remapped keys to list per scheme and step.
        #[arg(long)]
        sample: Option<usize>,
    },

    /// Print the owner of each key under both schemes.
    Resolve {
        #[command(flatten)]
        topology: TopologyArgs,

        /// Keys to resolve.
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Print ring statistics and per-node ownership of the circle.
    Ring {
        #[command(flatten)]
        topology: TopologyArgs,
    },
}

/// Parse `add:<node>` / `remove:<node>`.
fn parse_step(s: &str) -> Result<TopologyChange, String> {
    match s.split_once(':') {
        Some(("add", node)) if !node.is_empty() => Ok(TopologyChange::Add(node.into())),
        Some(("remove", node)) if !node.is_empty() => Ok(TopologyChange::Remove(node.into())),
        _ => Err(format!("expected add:<node> or remove:<node>, got {s:?}")),
    }
}

/// Merge `--step`, `--add` and `--remove` into one list in command-line
/// order.
fn ordered_steps(
    matches: &ArgMatches,
    steps: Vec<TopologyChange>,
    add: Vec<String>,
    remove: Vec<String>,
) -> Vec<TopologyChange> {
    let indices = |id: &str| matches.indices_of(id).into_iter().flatten();

    let mut indexed: Vec<(usize, TopologyChange)> = indices("steps")
        .zip(steps)
        .chain(
            indices("add").zip(add.into_iter().map(|node| TopologyChange::Add(node.into()))),
        )
        .chain(
            indices("remove")
                .zip(remove.into_iter().map(|node| TopologyChange::Remove(node.into()))),
        )
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, change)| change).collect()
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    match cli.command {
        Commands::Simulate {
            topology,
            keys,
            seed,
            steps,
            add,
            remove,
            trials,
            sample,
        } => {
            let steps = match matches.subcommand_matches("simulate") {
                Some(sub) => ordered_steps(sub, steps, add, remove),
                None => steps,
            };

            // CLI args override config file values.
            apply_topology(&mut config, &topology);
            if let Some(count) = keys {
                config.keys.count = count;
            }
            if let Some(seed) = seed {
                config.keys.seed = seed;
            }
            if !steps.is_empty() {
                config.scenario.steps = steps;
            }
            if let Some(trials) = trials {
                config.report.trials = trials;
            }
            if let Some(sample) = sample {
                config.report.sample = sample;
            }
            cmd_simulate(&config)
        }
        Commands::Resolve { topology, keys } => {
            apply_topology(&mut config, &topology);
            cmd_resolve(&config, &keys)
        }
        Commands::Ring { topology } => {
            apply_topology(&mut config, &topology);
            cmd_ring(&config)
        }
    }
}

fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_topology(config: &mut CliConfig, args: &TopologyArgs) {
    if let Some(count) = args.nodes {
        config.scenario.nodes = Some(numbered_nodes(count));
    }
    if let Some(replicas) = args.replicas {
        config.ring.replica_count = replicas;
    }
}

// -----------------------------------------------------------------------
// spindle simulate
// -----------------------------------------------------------------------

fn cmd_simulate(config: &CliConfig) -> Result<()> {
    let scenario = config.scenario();
    if scenario.steps.is_empty() {
        bail!("scenario has no steps; add one with --step, --add, --remove or [scenario] steps");
    }

    if config.report.trials > 1 {
        let first = config.keys.seed;
        let seeds = first..first.saturating_add(config.report.trials);
        info!(trials = config.report.trials, first_seed = first, "running trials");
        let summary =
            run_trials(&scenario, &config.keys, seeds).context("trial run failed")?;
        print!("{summary}");
        return Ok(());
    }

    let keys = generate_keys(&config.keys);
    let report = scenario.run(&keys).context("scenario failed")?;

    let mut out = String::new();
    report.render(&mut out, config.report.sample)?;
    print!("{out}");
    Ok(())
}

// -----------------------------------------------------------------------
// spindle resolve
// -----------------------------------------------------------------------

fn cmd_resolve(config: &CliConfig, keys: &[String]) -> Result<()> {
    let nodes = config.nodes();
    let ring = Ring::new(nodes.iter().cloned(), config.ring.replica_count)
        .context("failed to build ring")?;
    let modulo = ModuloAssigner::new(nodes).context("failed to build modulo assigner")?;

    for key in keys {
        let on_ring = ring.resolve(key)?;
        let on_modulo = modulo.assign(key)?;
        println!("{key}  ring={on_ring}  modulo={on_modulo}");
    }
    Ok(())
}

// -----------------------------------------------------------------------
// spindle ring
// -----------------------------------------------------------------------

fn cmd_ring(config: &CliConfig) -> Result<()> {
    let ring = Ring::new(config.nodes(), config.ring.replica_count)
        .context("failed to build ring")?;

    println!("Nodes:    {}", ring.node_count());
    println!("Replicas: {}", ring.replica_count());
    println!("Vnodes:   {}", ring.vnode_count());
    println!();

    let ownership = ring.ownership();
    for (node, share) in &ownership {
        println!("  {:<16} {:>7.3}%", node.as_str(), share * 100.0);
    }

    if let (Some(min), Some(max)) = (
        ownership.values().copied().reduce(f64::min),
        ownership.values().copied().reduce(f64::max),
    ) {
        println!();
        println!(
            "Ownership spread: min {:.3}%, max {:.3}%",
            min * 100.0,
            max * 100.0
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
