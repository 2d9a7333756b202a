//! Per-frame analysis pipeline
//!
//! Landmark frame → primary angle → stage, auxiliary measurements → faults
//! → repetition state machine → session counters.

use pose_geometry::LandmarkFrame;
use tracing::{debug, info};

use crate::analysis::EngineEvent;
use crate::config::Exercise;
use crate::faults::{self, ConstraintEffect, FormFault};
use crate::sequence::{self, Transition};
use crate::state::EngineState;

/// New state plus the events one frame produced
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub state: EngineState,
    pub events: Vec<EngineEvent>,
}

/// Run one frame through the engine.
///
/// Pure: the only inputs are the previous state, the frame, and the
/// exercise. A completed session ignores every further frame.
pub fn process_frame(state: EngineState, frame: &LandmarkFrame, exercise: &Exercise) -> FrameOutput {
    let mut state = state;
    let mut events = Vec::new();

    if state.session.is_complete() {
        debug!("Session complete, ignoring frame at {}ms", frame.timestamp_ms);
        return FrameOutput { state, events };
    }

    let angle = match frame
        .require(exercise.required_joints())
        .and_then(|_| exercise.primary_angle(frame))
    {
        Ok(angle) => angle,
        Err(e) => {
            debug!("No sample at {}ms: {}", frame.timestamp_ms, e);
            sequence::advance(
                &mut state.sequence,
                &mut state.faults,
                None,
                exercise.pattern(),
                exercise.sequence_cap(),
            );
            return FrameOutput { state, events };
        }
    };

    state.session.on_sample(angle);
    let stage = exercise.thresholds().classify(angle);
    events.push(EngineEvent::Sample {
        timestamp_ms: frame.timestamp_ms,
        angle,
        stage,
    });

    let measurements = faults::measure_all(exercise.constraints(), frame);
    for violation in faults::evaluate(exercise.constraints(), &measurements, stage, &mut state.baselines) {
        if violation.effect == ConstraintEffect::Invalidate
            && state.faults.insert(FormFault {
                category: violation.category,
                reason: violation.reason.clone(),
            })
        {
            debug!("Form fault recorded: {}", violation.reason);
        }
        events.push(EngineEvent::PostureWarning {
            category: violation.category,
            reason: violation.reason,
            effect: violation.effect,
        });
    }

    let transition = sequence::advance(
        &mut state.sequence,
        &mut state.faults,
        stage,
        exercise.pattern(),
        exercise.sequence_cap(),
    );

    if let Transition::Emitted(result) = transition {
        state.session.on_result(&result);
        events.push(EngineEvent::Repetition(result));

        if state.session.is_complete() {
            info!(
                "Session complete: {}/{} valid",
                state.session.valid_reps(),
                state.session.total_reps()
            );
            events.push(EngineEvent::SessionComplete(state.session.summary(exercise.name())));
        }
    }

    FrameOutput { state, events }
}
