//! Error types for the simulation harness.

use spindle_placement::PlacementError;

/// Errors produced while running scenarios.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// An assigner or the ring rejected an operation.
    #[error("placement error: {0}")]
    Placement(#[from] PlacementError),

    /// A multi-seed run was requested with no seeds.
    #[error("no seeds given for trials")]
    NoSeeds,
}
