//! Tracking controller
//!
//! Owns one engine and drives it from the pose source, one frame at a time.

use exercise_engine::{EngineEvent, ExerciseConfig, ExerciseEngine, SessionSummary};
use feedback::{FeedbackConfig, FeedbackDispatcher, Notifier};
use pose_geometry::LandmarkFrame;
use session_store::SessionStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::TrackerError;

/// Shared start/stop flag for a tracking run
#[derive(Debug, Clone, Default)]
pub struct TrackingHandle {
    tracking: Arc<AtomicBool>,
    stopped: Arc<Notify>,
}

impl TrackingHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        self.tracking.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        if self.tracking.swap(false, Ordering::SeqCst) {
            info!("Tracking stop requested");
        }
        self.stopped.notify_waiters();
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::SeqCst)
    }

    /// Resolves once tracking is off
    pub async fn stopped(&self) {
        let notified = self.stopped.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if !self.is_tracking() {
            return;
        }
        notified.await;
    }
}

/// Outcome of one tracking run
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub summary: SessionSummary,
    pub completed: bool,
    /// Store id, present once a completed session was saved
    pub record_id: Option<u64>,
    pub frames_processed: u64,
    /// The pose source closed before the run ended
    pub source_exhausted: bool,
    pub notices_delivered: u64,
    pub notices_suppressed: u64,
}

/// Drives an [`ExerciseEngine`] from a frame channel
pub struct TrackingController<N: Notifier> {
    engine: ExerciseEngine,
    dispatcher: FeedbackDispatcher<N>,
    store: Arc<dyn SessionStore>,
    handle: TrackingHandle,
}

impl<N: Notifier> TrackingController<N> {
    /// Validate the exercise and build the controller. Fails before any
    /// frame is read if the definition is malformed.
    pub fn new(
        exercise: ExerciseConfig,
        target_reps: u32,
        feedback: FeedbackConfig,
        notifier: N,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, TrackerError> {
        let exercise = exercise.validate()?;
        let engine = ExerciseEngine::new(exercise, target_reps)?;

        Ok(Self {
            engine,
            dispatcher: FeedbackDispatcher::new(feedback, notifier),
            store,
            handle: TrackingHandle::new(),
        })
    }

    pub fn handle(&self) -> TrackingHandle {
        self.handle.clone()
    }

    pub fn engine(&self) -> &ExerciseEngine {
        &self.engine
    }

    /// Consume frames until the session completes, the source ends, or
    /// tracking is stopped
    pub async fn run(&mut self, mut frames: mpsc::Receiver<LandmarkFrame>) -> Result<SessionReport, TrackerError> {
        self.engine.start();
        self.handle.start();

        let mut frames_processed = 0u64;
        let mut record_id = None;
        let mut source_exhausted = false;

        loop {
            let frame = tokio::select! {
                frame = frames.recv() => frame,
                _ = self.handle.stopped() => break,
            };
            let Some(frame) = frame else {
                source_exhausted = true;
                break;
            };

            // Stop may land between receive and processing
            if !self.handle.is_tracking() {
                debug!("Discarding frame at {}ms after stop", frame.timestamp_ms);
                break;
            }

            frames_processed += 1;
            for event in self.engine.process(&frame) {
                self.dispatcher.dispatch(&event);

                if let EngineEvent::SessionComplete(summary) = &event {
                    record_id = Some(self.store.save(summary)?);
                    self.handle.stop();
                }
            }

            if self.engine.is_complete() {
                break;
            }
        }

        self.engine.stop();
        self.handle.stop();

        let completed = self.engine.is_complete();
        if !completed {
            warn!(
                "Tracking ended before target: {}/{} reps",
                self.engine.state().session.total_reps(),
                self.engine.state().session.target_reps()
            );
        }

        Ok(SessionReport {
            summary: self.engine.summary(),
            completed,
            record_id,
            frames_processed,
            source_exhausted,
            notices_delivered: self.dispatcher.delivered(),
            notices_suppressed: self.dispatcher.suppressed(),
        })
    }
}
