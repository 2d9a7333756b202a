//! Configuration error types

use thiserror::Error;

use crate::stage::Stage;

/// Errors detected while validating an exercise definition.
///
/// All of these are fatal to starting a session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Stage threshold table is empty")]
    EmptyThresholds,

    #[error("{stage} range [{min}, {max}] is invalid (must be finite, ordered, and inside 0..=180)")]
    InvalidRange { stage: Stage, min: f64, max: f64 },

    #[error("{0} has more than one threshold band")]
    DuplicateStage(Stage),

    #[error("{lower} and {upper} overlap at {at} degrees")]
    Overlap { lower: Stage, upper: Stage, at: f64 },

    #[error("Gap between {lower} and {upper}: {from}..{to} degrees is not covered")]
    Gap {
        lower: Stage,
        upper: Stage,
        from: f64,
        to: f64,
    },

    #[error("Canonical pattern needs at least 2 stages, got {0}")]
    PatternTooShort(usize),

    #[error("Canonical pattern has {len} stages but the sequence cap is {cap}")]
    PatternTooLong { len: usize, cap: usize },

    #[error("Canonical pattern repeats {stage} consecutively at position {position}")]
    RepeatedStage { stage: Stage, position: usize },

    #[error("Canonical pattern uses {0} which has no threshold band")]
    UnknownStage(Stage),

    #[error("Sequence cap must be at least 2, got {0}")]
    InvalidCap(usize),

    #[error("Invalid fault constraint '{reason}': {detail}")]
    InvalidConstraint { reason: String, detail: &'static str },

    #[error("Target repetitions must be at least 1")]
    InvalidTarget,
}
