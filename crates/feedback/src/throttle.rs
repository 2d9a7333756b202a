//! Feedback throttle implementation

use exercise_engine::FaultCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Feedback configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Minimum gap between repetition notices (milliseconds)
    pub repetition_interval_ms: u64,
    /// Minimum gap between warnings of the same posture category (milliseconds)
    pub posture_interval_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            repetition_interval_ms: 1000,
            posture_interval_ms: 2000,
        }
    }
}

impl FeedbackConfig {
    /// Every notice goes through
    pub fn unthrottled() -> Self {
        Self {
            repetition_interval_ms: 0,
            posture_interval_ms: 0,
        }
    }

    /// Fewer interruptions for guided sessions
    pub fn quiet() -> Self {
        Self {
            repetition_interval_ms: 1500,
            posture_interval_ms: 5000,
        }
    }

    pub fn repetition_interval(&self) -> Duration {
        Duration::from_millis(self.repetition_interval_ms)
    }

    pub fn posture_interval(&self) -> Duration {
        Duration::from_millis(self.posture_interval_ms)
    }
}

/// Logical notification channel; each has its own last-emitted time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Repetition,
    Posture(FaultCategory),
    Session,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Repetition => f.write_str("repetition"),
            Channel::Posture(category) => write!(f, "posture/{}", category),
            Channel::Session => f.write_str("session"),
        }
    }
}

/// Per-channel rate limiter
#[derive(Debug, Default)]
pub struct FeedbackThrottle {
    /// Last emission by channel
    last_emitted: HashMap<Channel, Instant>,
}

impl FeedbackThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a notice on `channel` may be surfaced now; stamps the channel if so
    pub fn try_emit(&mut self, channel: Channel, min_interval: Duration) -> bool {
        self.try_emit_at(channel, min_interval, Instant::now())
    }

    /// [`try_emit`](Self::try_emit) with an explicit clock
    pub fn try_emit_at(&mut self, channel: Channel, min_interval: Duration, now: Instant) -> bool {
        if let Some(last) = self.last_emitted.get(&channel) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < min_interval {
                debug!(
                    "Notice suppressed on {}: {}ms < {}ms",
                    channel,
                    elapsed.as_millis(),
                    min_interval.as_millis()
                );
                return false;
            }
        }

        self.last_emitted.insert(channel, now);
        true
    }

    /// Forget all emission times
    pub fn reset(&mut self) {
        info!("Feedback throttle reset ({} channels)", self.last_emitted.len());
        self.last_emitted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_millis(1000);

    #[test]
    fn test_first_emit_passes() {
        let mut throttle = FeedbackThrottle::new();
        assert!(throttle.try_emit(Channel::Repetition, SECOND));
    }

    #[test]
    fn test_interval_enforced() {
        let mut throttle = FeedbackThrottle::new();
        let t0 = Instant::now();

        assert!(throttle.try_emit_at(Channel::Repetition, SECOND, t0));
        assert!(!throttle.try_emit_at(Channel::Repetition, SECOND, t0 + Duration::from_millis(400)));
        // Suppressed attempts do not push the window forward
        assert!(throttle.try_emit_at(Channel::Repetition, SECOND, t0 + SECOND));
        assert!(!throttle.try_emit_at(Channel::Repetition, SECOND, t0 + Duration::from_millis(1999)));
    }

    #[test]
    fn test_channels_are_independent() {
        let mut throttle = FeedbackThrottle::new();
        let t0 = Instant::now();
        let long = Duration::from_secs(10);

        assert!(throttle.try_emit_at(Channel::Posture(FaultCategory::Alignment), long, t0));
        assert!(throttle.try_emit_at(Channel::Posture(FaultCategory::ScapularElevation), long, t0));
        assert!(throttle.try_emit_at(Channel::Repetition, long, t0));
        assert!(!throttle.try_emit_at(Channel::Posture(FaultCategory::Alignment), long, t0));
    }

    #[test]
    fn test_zero_interval_never_throttles() {
        let mut throttle = FeedbackThrottle::new();
        let t0 = Instant::now();
        for _ in 0..3 {
            assert!(throttle.try_emit_at(Channel::Session, Duration::ZERO, t0));
        }
    }

    #[test]
    fn test_reset() {
        let mut throttle = FeedbackThrottle::new();
        let t0 = Instant::now();
        throttle.try_emit_at(Channel::Repetition, SECOND, t0);
        throttle.reset();
        assert!(throttle.try_emit_at(Channel::Repetition, SECOND, t0));
    }

    #[test]
    fn test_config_defaults_and_partial_override() {
        let config: FeedbackConfig = serde_json::from_str(r#"{"posture_interval_ms": 500}"#).unwrap();
        assert_eq!(config.repetition_interval(), SECOND);
        assert_eq!(config.posture_interval(), Duration::from_millis(500));
        assert_eq!(FeedbackConfig::unthrottled().posture_interval(), Duration::ZERO);
        assert!(FeedbackConfig::quiet().posture_interval() > FeedbackConfig::default().posture_interval());
    }
}
