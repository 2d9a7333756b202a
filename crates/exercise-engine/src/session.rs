//! Session counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::RepetitionResult;

/// Repetitions per session unless configured otherwise
pub const DEFAULT_TARGET_REPS: u32 = 10;

/// Which running extremum of the primary angle is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumMode {
    #[default]
    Max,
    Min,
}

/// Running repetition counters for one tracked exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    valid_reps: u32,
    invalid_reps: u32,
    total_reps: u32,
    target_reps: u32,
    extremum: Option<f64>,
    mode: ExtremumMode,
    started_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_REPS, ExtremumMode::default(), DateTime::<Utc>::default())
    }
}

impl Session {
    pub fn new(target_reps: u32, mode: ExtremumMode, started_at: DateTime<Utc>) -> Self {
        Self {
            valid_reps: 0,
            invalid_reps: 0,
            total_reps: 0,
            target_reps,
            extremum: None,
            mode,
            started_at,
        }
    }

    /// Count a finished attempt
    pub fn on_result(&mut self, result: &RepetitionResult) {
        if result.is_valid() {
            self.valid_reps += 1;
        } else {
            self.invalid_reps += 1;
        }
        self.total_reps += 1;

        info!(
            "Repetition {}/{}: {:?} (valid={}, invalid={})",
            self.total_reps, self.target_reps, result.outcome, self.valid_reps, self.invalid_reps
        );
    }

    /// Fold a primary angle sample into the running extremum
    pub fn on_sample(&mut self, angle: f64) {
        if !angle.is_finite() {
            return;
        }
        self.extremum = Some(match (self.extremum, self.mode) {
            (None, _) => angle,
            (Some(current), ExtremumMode::Max) => current.max(angle),
            (Some(current), ExtremumMode::Min) => current.min(angle),
        });
    }

    pub fn is_complete(&self) -> bool {
        self.total_reps >= self.target_reps
    }

    pub fn valid_reps(&self) -> u32 {
        self.valid_reps
    }

    pub fn invalid_reps(&self) -> u32 {
        self.invalid_reps
    }

    pub fn total_reps(&self) -> u32 {
        self.total_reps
    }

    pub fn target_reps(&self) -> u32 {
        self.target_reps
    }

    pub fn extremum(&self) -> Option<f64> {
        self.extremum
    }

    pub fn mode(&self) -> ExtremumMode {
        self.mode
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Totals handed to the session store
    pub fn summary(&self, exercise: &str) -> SessionSummary {
        SessionSummary {
            exercise: exercise.to_string(),
            valid_reps: self.valid_reps,
            invalid_reps: self.invalid_reps,
            total_reps: self.total_reps,
            target_reps: self.target_reps,
            extremum: self.extremum,
            started_at: self.started_at,
        }
    }
}

/// Final session totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub exercise: String,
    pub valid_reps: u32,
    pub invalid_reps: u32,
    pub total_reps: u32,
    pub target_reps: u32,
    pub extremum: Option<f64>,
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_counts_by_validity() {
        let mut session = Session::new(3, ExtremumMode::Max, Utc::now());

        session.on_result(&RepetitionResult::valid());
        session.on_result(&RepetitionResult::invalid(vec!["x".into()]));
        session.on_result(&RepetitionResult::incomplete(vec![]));

        assert_eq!(session.valid_reps(), 1);
        assert_eq!(session.invalid_reps(), 2);
        assert_eq!(session.total_reps(), 3);
        assert!(session.is_complete());
    }

    #[test]
    fn test_extremum_modes() {
        let mut max = Session::new(10, ExtremumMode::Max, Utc::now());
        let mut min = Session::new(10, ExtremumMode::Min, Utc::now());
        assert_eq!(max.extremum(), None);

        for angle in [120.0, 165.0, f64::NAN, 95.0] {
            max.on_sample(angle);
            min.on_sample(angle);
        }

        assert_eq!(max.extremum(), Some(165.0));
        assert_eq!(min.extremum(), Some(95.0));
    }

    #[test]
    fn test_summary_copies_totals() {
        let started = Utc::now();
        let mut session = Session::new(1, ExtremumMode::Min, started);
        session.on_sample(88.0);
        session.on_result(&RepetitionResult::valid());

        let summary = session.summary("squat");
        assert_eq!(summary.exercise, "squat");
        assert_eq!(summary.total_reps, 1);
        assert_eq!(summary.extremum, Some(88.0));
        assert_eq!(summary.started_at, started);
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_and_monotonic(outcomes in proptest::collection::vec(0u8..3, 0..64)) {
            let mut session = Session::new(1000, ExtremumMode::Max, Utc::now());
            let mut previous_total = 0;

            for o in outcomes {
                let result = match o {
                    0 => RepetitionResult::valid(),
                    1 => RepetitionResult::invalid(vec![]),
                    _ => RepetitionResult::incomplete(vec![]),
                };
                session.on_result(&result);

                prop_assert!(session.total_reps() >= previous_total);
                prop_assert_eq!(session.total_reps(), session.valid_reps() + session.invalid_reps());
                previous_total = session.total_reps();
            }
        }
    }
}
