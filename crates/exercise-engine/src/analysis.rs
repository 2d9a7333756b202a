//! Repetition results and engine events

use serde::{Deserialize, Serialize};

use crate::faults::{ConstraintEffect, FaultCategory};
use crate::session::SessionSummary;
use crate::stage::Stage;

/// Reason attached when the athlete returns to the start before the peak stage
pub const REASON_INCOMPLETE: &str = "incomplete range of motion";

/// Reason attached when the stage sequence fills up without matching
pub const REASON_PATTERN_MISMATCH: &str = "movement did not follow the expected stage sequence";

/// Outcome of one repetition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepOutcome {
    Valid,
    Invalid,
    /// Returned to the start position without reaching the peak
    Incomplete,
}

/// Immutable result emitted once per completed or abandoned attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepetitionResult {
    pub outcome: RepOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

impl RepetitionResult {
    pub fn valid() -> Self {
        Self {
            outcome: RepOutcome::Valid,
            reasons: Vec::new(),
        }
    }

    pub fn invalid(reasons: Vec<String>) -> Self {
        Self {
            outcome: RepOutcome::Invalid,
            reasons,
        }
    }

    pub fn incomplete(reasons: Vec<String>) -> Self {
        Self {
            outcome: RepOutcome::Incomplete,
            reasons,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.outcome == RepOutcome::Valid
    }
}

/// Events produced by processing one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Primary angle and classified stage, for on-screen overlay
    Sample {
        timestamp_ms: u64,
        angle: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        stage: Option<Stage>,
    },

    /// A posture constraint is violated on this frame
    PostureWarning {
        category: FaultCategory,
        reason: String,
        effect: ConstraintEffect,
    },

    /// A repetition attempt finished
    Repetition(RepetitionResult),

    /// Target repetitions reached; emitted once
    SessionComplete(SessionSummary),
}

impl EngineEvent {
    pub fn as_repetition(&self) -> Option<&RepetitionResult> {
        match self {
            EngineEvent::Repetition(result) => Some(result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_constructors() {
        assert!(RepetitionResult::valid().is_valid());
        assert!(!RepetitionResult::invalid(vec!["x".into()]).is_valid());

        let incomplete = RepetitionResult::incomplete(vec![REASON_INCOMPLETE.into()]);
        assert!(!incomplete.is_valid());
        assert_eq!(incomplete.outcome, RepOutcome::Incomplete);
    }

    #[test]
    fn test_event_serialization_tags() {
        let event = EngineEvent::Repetition(RepetitionResult::valid());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "repetition");
        assert_eq!(json["outcome"], "valid");
        assert!(json.get("reasons").is_none());
    }
}
