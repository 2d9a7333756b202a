//! Engine state carried between frames

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Exercise;
use crate::faults::{Baselines, FormFaults};
use crate::sequence::StageSequence;
use crate::session::Session;

/// Everything the engine remembers between frames.
///
/// Owned by exactly one engine per tracked limb/exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    /// Stages visited in the current attempt
    pub sequence: StageSequence,

    /// Faults recorded in the current attempt
    pub faults: FormFaults,

    /// Session baselines for ratio constraints
    pub baselines: Baselines,

    /// Repetition counters
    pub session: Session,
}

impl EngineState {
    /// Fresh state for a new session of `exercise`
    pub fn new(exercise: &Exercise, target_reps: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            session: Session::new(target_reps, exercise.extremum(), started_at),
            ..Default::default()
        }
    }

    /// Whether an attempt is in progress
    pub fn in_attempt(&self) -> bool {
        !self.sequence.is_empty()
    }
}
