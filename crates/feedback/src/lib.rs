//! User feedback
//!
//! Turns engine events into throttled, human-readable notices.
//! Each notification channel (repetitions, each posture category, session)
//! is rate-limited independently.

mod dispatcher;
mod throttle;

pub use dispatcher::{FeedbackDispatcher, LogNotifier, Notice, Notifier};
pub use throttle::{Channel, FeedbackConfig, FeedbackThrottle};
