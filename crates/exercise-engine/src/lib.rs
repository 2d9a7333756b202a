//! Exercise analysis engine
//!
//! Turns per-frame pose landmarks into repetition outcomes:
//! - Primary joint angle → movement stage
//! - Stage sequence → valid, invalid, or incomplete repetitions
//! - Auxiliary posture constraints → form faults and warnings
//! - Session counters toward a target repetition count

pub mod analysis;
pub mod config;
pub mod error;
pub mod faults;
pub mod pipeline;
pub mod presets;
pub mod sequence;
pub mod session;
pub mod stage;
pub mod state;

pub use analysis::{EngineEvent, RepOutcome, RepetitionResult};
pub use config::{Exercise, ExerciseConfig, ExerciseKind};
pub use error::ConfigError;
pub use faults::{ConstraintEffect, FaultCategory, FaultConstraint, FormFault, Limit, Measurement};
pub use pipeline::{process_frame, FrameOutput};
pub use sequence::{CanonicalPattern, StageSequence, Transition};
pub use session::{ExtremumMode, Session, SessionSummary, DEFAULT_TARGET_REPS};
pub use stage::{classify, AngleRange, Stage, StageBand, StageThresholds};
pub use state::EngineState;

use chrono::Utc;
use pose_geometry::LandmarkFrame;
use tracing::{debug, info};

/// Stateful wrapper around [`process_frame`] for one tracked exercise
pub struct ExerciseEngine {
    exercise: Exercise,
    state: EngineState,
    tracking: bool,
}

impl ExerciseEngine {
    /// Create an engine for a validated exercise
    pub fn new(exercise: Exercise, target_reps: u32) -> Result<Self, ConfigError> {
        if target_reps == 0 {
            return Err(ConfigError::InvalidTarget);
        }
        let state = EngineState::new(&exercise, target_reps, Utc::now());
        Ok(Self {
            exercise,
            state,
            tracking: false,
        })
    }

    /// Start accepting frames
    pub fn start(&mut self) {
        if !self.tracking {
            info!("Tracking started: {}", self.exercise.name());
            self.tracking = true;
        }
    }

    /// Stop accepting frames; counters are kept
    pub fn stop(&mut self) {
        if self.tracking {
            info!(
                "Tracking stopped: {} ({} reps)",
                self.exercise.name(),
                self.state.session.total_reps()
            );
            self.tracking = false;
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Analyze one frame. Frames received while stopped are dropped.
    pub fn process(&mut self, frame: &LandmarkFrame) -> Vec<EngineEvent> {
        if !self.tracking {
            debug!("Not tracking, dropping frame at {}ms", frame.timestamp_ms);
            return Vec::new();
        }

        let state = std::mem::take(&mut self.state);
        let output = process_frame(state, frame, &self.exercise);
        self.state = output.state;
        output.events
    }

    /// Discard all progress and begin a new session
    pub fn reset_session(&mut self, target_reps: u32) -> Result<(), ConfigError> {
        if target_reps == 0 {
            return Err(ConfigError::InvalidTarget);
        }
        self.state = EngineState::new(&self.exercise, target_reps, Utc::now());
        info!("Session reset: {} (target {})", self.exercise.name(), target_reps);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.state.session.is_complete()
    }

    pub fn summary(&self) -> SessionSummary {
        self.state.session.summary(self.exercise.name())
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_geometry::{Joint, Side};

    fn knee_frame(ts: u64, angle: f64) -> LandmarkFrame {
        let bend = (180.0 - angle).to_radians();
        LandmarkFrame::new(ts)
            .with(Joint::LeftHip, [0.0, 0.0])
            .with(Joint::LeftKnee, [0.0, 100.0])
            .with(Joint::LeftAnkle, [100.0 * bend.sin(), 100.0 + 100.0 * bend.cos()])
    }

    fn engine(target: u32) -> ExerciseEngine {
        let exercise = ExerciseKind::KneeFlexion.preset(Side::Left).validate().unwrap();
        ExerciseEngine::new(exercise, target).unwrap()
    }

    fn run_rep(engine: &mut ExerciseEngine) -> Vec<EngineEvent> {
        [100.0, 130.0, 165.0, 135.0, 95.0]
            .iter()
            .enumerate()
            .flat_map(|(i, &a)| engine.process(&knee_frame(i as u64, a)))
            .collect()
    }

    #[test]
    fn test_zero_target_rejected() {
        let exercise = ExerciseKind::Squat.preset(Side::Left).validate().unwrap();
        assert!(matches!(ExerciseEngine::new(exercise, 0), Err(ConfigError::InvalidTarget)));
    }

    #[test]
    fn test_frames_ignored_until_started() {
        let mut engine = engine(10);
        assert!(run_rep(&mut engine).is_empty());
        assert_eq!(engine.state().session.total_reps(), 0);

        engine.start();
        let events = run_rep(&mut engine);
        assert_eq!(events.iter().filter_map(EngineEvent::as_repetition).count(), 1);
        assert_eq!(engine.summary().valid_reps, 1);

        engine.stop();
        assert!(!engine.is_tracking());
        assert!(run_rep(&mut engine).is_empty());
        assert_eq!(engine.summary().valid_reps, 1);
    }

    #[test]
    fn test_reset_session() {
        let mut engine = engine(1);
        engine.start();
        run_rep(&mut engine);
        assert!(engine.is_complete());

        engine.reset_session(3).unwrap();
        assert!(!engine.is_complete());
        assert_eq!(engine.state().session.total_reps(), 0);
        assert_eq!(engine.state().session.target_reps(), 3);
        assert!(engine.is_tracking());
        assert_eq!(engine.reset_session(0), Err(ConfigError::InvalidTarget));
    }
}
