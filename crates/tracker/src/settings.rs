//! Runtime settings

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use exercise_engine::{ExerciseConfig, ExerciseKind, DEFAULT_TARGET_REPS};
use feedback::FeedbackConfig;
use pose_geometry::Side;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use crate::TrackerError;

/// Environment variable prefix (`REPTRACK__TARGET_REPS=12`)
pub const ENV_PREFIX: &str = "REPTRACK";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Tracker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Built-in exercise to track
    pub exercise: ExerciseKind,
    /// Body side the exercise is performed with
    pub side: Side,
    /// Custom exercise definition (JSON), replaces the built-in preset
    pub exercise_definition: Option<PathBuf>,
    /// Repetitions until the session completes
    pub target_reps: u32,
    /// JSON-lines landmark recording, `-` for stdin
    pub input: String,
    /// Maximum log level
    pub log_level: String,
    pub log_format: LogFormat,
    pub feedback: FeedbackConfig,
    /// Frames buffered between the pose source and the engine
    pub channel_capacity: usize,
    /// Session history file, restored on start and rewritten on completion
    pub store_path: Option<PathBuf>,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            exercise: ExerciseKind::default(),
            side: Side::default(),
            exercise_definition: None,
            target_reps: DEFAULT_TARGET_REPS,
            input: "-".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            feedback: FeedbackConfig::default(),
            channel_capacity: 64,
            store_path: None,
        }
    }
}

impl TrackerSettings {
    /// Load from an optional settings file plus `REPTRACK__*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, TrackerError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        Self::from_builder(builder.add_source(Self::environment()))
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, TrackerError> {
        let settings: Self = builder.build()?.try_deserialize()?;
        if settings.channel_capacity == 0 {
            return Err(TrackerError::InvalidSettings("channel_capacity must be at least 1"));
        }
        Ok(settings)
    }

    /// Exercise definition to validate, from file or preset
    pub fn exercise_config(&self) -> Result<ExerciseConfig, TrackerError> {
        match &self.exercise_definition {
            Some(path) => {
                info!("Loading exercise definition from {}", path.display());
                let text = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&text)?)
            }
            None => Ok(self.exercise.preset(self.side)),
        }
    }

    /// Parsed log level, INFO when unrecognized
    pub fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }

    pub fn reads_stdin(&self) -> bool {
        self.input == "-"
    }
}
