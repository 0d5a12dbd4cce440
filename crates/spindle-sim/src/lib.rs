//! Simulation harness comparing modulo hashing and consistent hashing.
//!
//! This crate provides:
//! - [`generate_keys`]: a reproducible, seeded key universe.
//! - [`Scenario`]: an initial node set plus scripted add/remove steps, run
//!   against both schemes with the same keys.
//! - [`ScenarioReport`]: per-step remap counts and load for both schemes.
//! - [`run_trials`]: the same scenario repeated across seeds.

mod error;
mod keys;
mod report;
mod scenario;

pub use error::SimError;
pub use keys::{KeySpec, generate_keys};
pub use report::{
    FractionStats, ScenarioReport, SchemeOutcome, StepReport, StepSummary, TrialSummary,
};
pub use scenario::{Scenario, run_trials};
