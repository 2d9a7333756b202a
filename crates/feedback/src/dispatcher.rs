//! Engine events → user-facing notices

use exercise_engine::{EngineEvent, FaultCategory, RepOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::throttle::{Channel, FeedbackConfig, FeedbackThrottle};

/// Human-readable notice for on-screen display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    RepetitionValid,
    RepetitionInvalid {
        outcome: RepOutcome,
        reasons: Vec<String>,
    },
    PostureWarning {
        category: FaultCategory,
        reason: String,
    },
    SessionComplete {
        valid_reps: u32,
        total_reps: u32,
        target_reps: u32,
    },
}

impl Notice {
    fn channel(&self) -> Channel {
        match self {
            Notice::RepetitionValid | Notice::RepetitionInvalid { .. } => Channel::Repetition,
            Notice::PostureWarning { category, .. } => Channel::Posture(*category),
            Notice::SessionComplete { .. } => Channel::Session,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::RepetitionValid => f.write_str("Good rep!"),
            Notice::RepetitionInvalid { reasons, .. } if reasons.is_empty() => f.write_str("Invalid rep"),
            Notice::RepetitionInvalid { reasons, .. } => write!(f, "Invalid rep: {}", reasons.join(", ")),
            Notice::PostureWarning { reason, .. } => f.write_str(reason),
            Notice::SessionComplete {
                valid_reps,
                total_reps,
                target_reps,
            } => write!(
                f,
                "Exercise completed: {} of {} valid (target {})",
                valid_reps, total_reps, target_reps
            ),
        }
    }
}

/// Receiver of throttled notices. Delivery is fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice {
            Notice::RepetitionValid | Notice::SessionComplete { .. } => info!("{}", notice),
            Notice::RepetitionInvalid { .. } | Notice::PostureWarning { .. } => warn!("{}", notice),
        }
    }
}

/// Maps engine events to notices and rate-limits them per channel
pub struct FeedbackDispatcher<N: Notifier> {
    config: FeedbackConfig,
    throttle: FeedbackThrottle,
    notifier: N,
    delivered: u64,
    suppressed: u64,
}

impl<N: Notifier> FeedbackDispatcher<N> {
    pub fn new(config: FeedbackConfig, notifier: N) -> Self {
        info!("Creating feedback dispatcher with config: {:?}", config);
        Self {
            config,
            throttle: FeedbackThrottle::new(),
            notifier,
            delivered: 0,
            suppressed: 0,
        }
    }

    /// Route one engine event; returns whether a notice was delivered
    pub fn dispatch(&mut self, event: &EngineEvent) -> bool {
        self.dispatch_at(event, Instant::now())
    }

    pub fn dispatch_at(&mut self, event: &EngineEvent, now: Instant) -> bool {
        let Some(notice) = Self::notice_for(event) else {
            return false;
        };

        let channel = notice.channel();
        let interval = match channel {
            Channel::Repetition => self.config.repetition_interval(),
            Channel::Posture(_) => self.config.posture_interval(),
            Channel::Session => Duration::ZERO,
        };

        if !self.throttle.try_emit_at(channel, interval, now) {
            self.suppressed += 1;
            return false;
        }

        debug!("Delivering notice on {}", channel);
        self.notifier.notify(&notice);
        self.delivered += 1;
        true
    }

    fn notice_for(event: &EngineEvent) -> Option<Notice> {
        match event {
            EngineEvent::Sample { .. } => None,
            EngineEvent::PostureWarning { category, reason, .. } => Some(Notice::PostureWarning {
                category: *category,
                reason: reason.clone(),
            }),
            EngineEvent::Repetition(result) if result.is_valid() => Some(Notice::RepetitionValid),
            EngineEvent::Repetition(result) => Some(Notice::RepetitionInvalid {
                outcome: result.outcome,
                reasons: result.reasons.clone(),
            }),
            EngineEvent::SessionComplete(summary) => Some(Notice::SessionComplete {
                valid_reps: summary.valid_reps,
                total_reps: summary.total_reps,
                target_reps: summary.target_reps,
            }),
        }
    }

    /// Start a new session's feedback from a clean slate
    pub fn reset(&mut self) {
        self.throttle.reset();
        self.delivered = 0;
        self.suppressed = 0;
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}
