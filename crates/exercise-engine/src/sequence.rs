//! Repetition state machine
//!
//! The machine's state is the sequence of distinct stages visited since the
//! last repetition boundary. Each classified frame either leaves it alone,
//! extends it, or closes the attempt with a [`RepetitionResult`] and resets.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{RepetitionResult, REASON_INCOMPLETE, REASON_PATTERN_MISMATCH};
use crate::error::ConfigError;
use crate::faults::FormFaults;
use crate::stage::{Stage, StageThresholds};

/// Default number of stages tracked before an unmatched attempt is rejected
pub const DEFAULT_SEQUENCE_CAP: usize = 5;

/// Stages visited since the last boundary, with consecutive duplicates collapsed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSequence {
    stages: Vec<Stage>,
}

impl StageSequence {
    pub fn as_slice(&self) -> &[Stage] {
        &self.stages
    }

    pub fn last(&self) -> Option<Stage> {
        self.stages.last().copied()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Append unless `stage` repeats the last element; returns whether it was appended
    fn push(&mut self, stage: Stage) -> bool {
        if self.last() == Some(stage) {
            return false;
        }
        self.stages.push(stage);
        true
    }

    fn clear(&mut self) {
        self.stages.clear();
    }
}

/// Stage order making up one correct repetition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalPattern(Vec<Stage>);

impl CanonicalPattern {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self(stages)
    }

    /// Extend, flex, peak, return, extend
    pub fn standard() -> Self {
        Self(vec![
            Stage::Stage1,
            Stage::Stage2,
            Stage::Stage3,
            Stage::Stage2,
            Stage::Stage1,
        ])
    }

    pub fn stages(&self) -> &[Stage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, sequence: &StageSequence) -> bool {
        self.0.as_slice() == sequence.as_slice()
    }

    pub(crate) fn validate(&self, cap: usize, thresholds: &StageThresholds) -> Result<(), ConfigError> {
        if self.0.len() < 2 {
            return Err(ConfigError::PatternTooShort(self.0.len()));
        }
        if self.0.len() > cap {
            return Err(ConfigError::PatternTooLong {
                len: self.0.len(),
                cap,
            });
        }
        if let Some(position) = self.0.windows(2).position(|w| w[0] == w[1]) {
            return Err(ConfigError::RepeatedStage {
                stage: self.0[position],
                position: position + 1,
            });
        }
        if let Some(&stage) = self.0.iter().find(|&&s| thresholds.band(s).is_none()) {
            return Err(ConfigError::UnknownStage(stage));
        }
        Ok(())
    }
}

/// What a single frame did to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed
    Unchanged,
    /// Tracking broke; sequence and faults discarded without a result
    Reset,
    /// New stage appended, attempt still in progress
    Extended,
    /// Attempt closed; sequence and faults reset
    Emitted(RepetitionResult),
}

/// Feed one classified stage (or `None`) into the state machine
pub fn advance(
    sequence: &mut StageSequence,
    faults: &mut FormFaults,
    stage: Option<Stage>,
    pattern: &CanonicalPattern,
    cap: usize,
) -> Transition {
    let Some(stage) = stage else {
        let had_attempt = !sequence.is_empty();
        sequence.clear();
        faults.clear();
        if had_attempt {
            debug!("Stage lost, resetting sequence");
            return Transition::Reset;
        }
        return Transition::Unchanged;
    };

    let previous = sequence.last();
    if !sequence.push(stage) {
        return Transition::Unchanged;
    }
    debug!("Stage sequence: {:?}", sequence.as_slice());

    let result = if pattern.matches(sequence) {
        if faults.is_empty() {
            RepetitionResult::valid()
        } else {
            RepetitionResult::invalid(faults.reasons())
        }
    } else if sequence.len() >= cap {
        let mut reasons = vec![REASON_PATTERN_MISMATCH.to_string()];
        reasons.extend(faults.reasons());
        RepetitionResult::invalid(reasons)
    } else if sequence.len() < pattern.len()
        && pattern.stages().first() == Some(&stage)
        && previous.is_some()
        && pattern.stages().get(1).copied() == previous
    {
        let mut reasons = vec![REASON_INCOMPLETE.to_string()];
        reasons.extend(faults.reasons());
        RepetitionResult::incomplete(reasons)
    } else {
        return Transition::Extended;
    };

    sequence.clear();
    faults.clear();
    Transition::Emitted(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faults::{FaultCategory, FormFault};
    use crate::stage::{AngleRange, StageBand};

    use Stage::{Stage1 as S1, Stage2 as S2, Stage3 as S3};

    struct Machine {
        sequence: StageSequence,
        faults: FormFaults,
        pattern: CanonicalPattern,
    }

    impl Machine {
        fn new() -> Self {
            Self {
                sequence: StageSequence::default(),
                faults: FormFaults::default(),
                pattern: CanonicalPattern::standard(),
            }
        }

        fn feed(&mut self, stage: Option<Stage>) -> Transition {
            advance(&mut self.sequence, &mut self.faults, stage, &self.pattern, DEFAULT_SEQUENCE_CAP)
        }

        fn feed_all(&mut self, stages: &[Stage]) -> Vec<RepetitionResult> {
            stages
                .iter()
                .filter_map(|&s| match self.feed(Some(s)) {
                    Transition::Emitted(result) => Some(result),
                    _ => None,
                })
                .collect()
        }
    }

    #[test]
    fn test_canonical_cycle_is_valid() {
        let mut machine = Machine::new();
        let results = machine.feed_all(&[S1, S2, S3, S2, S1]);

        assert_eq!(results, vec![RepetitionResult::valid()]);
        assert!(machine.sequence.is_empty());
    }

    #[test]
    fn test_jitter_is_collapsed() {
        let mut machine = Machine::new();
        assert_eq!(machine.feed(Some(S1)), Transition::Extended);
        assert_eq!(machine.feed(Some(S1)), Transition::Unchanged);
        assert_eq!(machine.feed(Some(S2)), Transition::Extended);
        assert_eq!(machine.feed(Some(S2)), Transition::Unchanged);
        assert_eq!(machine.sequence.as_slice(), &[S1, S2]);
    }

    #[test]
    fn test_faulted_cycle_is_invalid() {
        let mut machine = Machine::new();
        machine.feed_all(&[S1, S2]);
        machine.faults.insert(FormFault {
            category: FaultCategory::TrunkFlexion,
            reason: "trunk too flexed".into(),
        });

        let results = machine.feed_all(&[S3, S2, S1]);
        assert_eq!(results, vec![RepetitionResult::invalid(vec!["trunk too flexed".into()])]);
        assert!(machine.faults.is_empty());
    }

    #[test]
    fn test_partial_return_is_incomplete() {
        let mut machine = Machine::new();
        let results = machine.feed_all(&[S1, S2, S1]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome, crate::RepOutcome::Incomplete);
        assert_eq!(results[0].reasons, vec![REASON_INCOMPLETE.to_string()]);
        assert!(machine.sequence.is_empty());
    }

    #[test]
    fn test_cap_without_match_is_invalid() {
        let mut machine = Machine::new();
        let results = machine.feed_all(&[S1, S2, S3, S2, S3]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome, crate::RepOutcome::Invalid);
        assert_eq!(results[0].reasons[0], REASON_PATTERN_MISMATCH);
        assert!(machine.sequence.is_empty());
    }

    #[test]
    fn test_lost_stage_resets_without_result() {
        let mut machine = Machine::new();
        machine.feed_all(&[S1, S2, S3]);
        machine.faults.insert(FormFault {
            category: FaultCategory::Alignment,
            reason: "misaligned".into(),
        });

        assert_eq!(machine.feed(None), Transition::Reset);
        assert!(machine.sequence.is_empty());
        assert!(machine.faults.is_empty());
        assert_eq!(machine.feed(None), Transition::Unchanged);

        // Clean cycle afterwards is valid
        assert_eq!(machine.feed_all(&[S1, S2, S3, S2, S1]), vec![RepetitionResult::valid()]);
    }

    #[test]
    fn test_back_to_back_repetitions() {
        let mut machine = Machine::new();
        let results = machine.feed_all(&[S1, S2, S3, S2, S1, S1, S2, S3, S2, S1]);
        assert_eq!(results, vec![RepetitionResult::valid(), RepetitionResult::valid()]);
    }

    #[test]
    fn test_pattern_validation() {
        let thresholds = StageThresholds::new(vec![
            StageBand::new(S1, AngleRange::closed_open(0.0, 90.0)),
            StageBand::new(S2, AngleRange::closed(90.0, 180.0)),
        ]);

        assert!(CanonicalPattern::new(vec![S1, S2, S1]).validate(5, &thresholds).is_ok());
        assert_eq!(
            CanonicalPattern::new(vec![S1]).validate(5, &thresholds),
            Err(ConfigError::PatternTooShort(1))
        );
        assert_eq!(
            CanonicalPattern::new(vec![S1, S2, S2, S1]).validate(5, &thresholds),
            Err(ConfigError::RepeatedStage { stage: S2, position: 2 })
        );
        assert_eq!(
            CanonicalPattern::standard().validate(5, &thresholds),
            Err(ConfigError::UnknownStage(S3))
        );
        assert_eq!(
            CanonicalPattern::new(vec![S1, S2, S1]).validate(2, &thresholds),
            Err(ConfigError::PatternTooLong { len: 3, cap: 2 })
        );
    }
}
