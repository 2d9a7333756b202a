//! Exercise configuration

use std::fmt;

use pose_geometry::{AngleConvention, GeometryError, Joint, JointTriple, LandmarkFrame, Side};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::faults::FaultConstraint;
use crate::presets;
use crate::sequence::{CanonicalPattern, DEFAULT_SEQUENCE_CAP};
use crate::session::ExtremumMode;
use crate::stage::StageThresholds;

fn default_sequence_cap() -> usize {
    DEFAULT_SEQUENCE_CAP
}

/// Data describing one exercise: what to measure, how to stage it,
/// what a correct repetition looks like, and which posture rules apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseConfig {
    /// Display name
    pub name: String,

    /// Landmarks for the primary joint angle
    pub primary: JointTriple,

    /// Raw or supplemented primary angle
    pub convention: AngleConvention,

    /// Stage bands over the primary angle
    pub thresholds: StageThresholds,

    /// Stage order of one correct repetition
    pub pattern: CanonicalPattern,

    /// Auxiliary posture rules
    #[serde(default)]
    pub constraints: Vec<FaultConstraint>,

    /// Whether the session tracks the largest or smallest primary angle
    pub extremum: ExtremumMode,

    /// Stages tracked before an unmatched attempt is rejected
    #[serde(default = "default_sequence_cap")]
    pub sequence_cap: usize,
}

impl ExerciseConfig {
    /// Check the definition and freeze it for a session
    pub fn validate(self) -> Result<Exercise, ConfigError> {
        let checked = self.check();
        if let Err(e) = &checked {
            warn!("Rejecting exercise '{}': {}", self.name, e);
        }
        checked?;

        let mut required: Vec<Joint> = self.primary.joints().to_vec();
        required.extend(self.constraints.iter().flat_map(|c| c.measurement.joints()));
        required.sort();
        required.dedup();

        info!(
            "Exercise '{}' ready: {} stage bands, pattern {:?}, {} constraints",
            self.name,
            self.thresholds.bands().len(),
            self.pattern.stages(),
            self.constraints.len()
        );

        Ok(Exercise {
            config: self,
            required,
        })
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.sequence_cap < 2 {
            return Err(ConfigError::InvalidCap(self.sequence_cap));
        }
        self.thresholds.validate()?;
        self.pattern.validate(self.sequence_cap, &self.thresholds)?;
        self.constraints.iter().try_for_each(FaultConstraint::validate)
    }
}

/// Validated exercise definition; the only form the engine accepts
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    config: ExerciseConfig,
    required: Vec<Joint>,
}

impl Exercise {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ExerciseConfig {
        &self.config
    }

    pub fn thresholds(&self) -> &StageThresholds {
        &self.config.thresholds
    }

    pub fn pattern(&self) -> &CanonicalPattern {
        &self.config.pattern
    }

    pub fn constraints(&self) -> &[FaultConstraint] {
        &self.config.constraints
    }

    pub fn extremum(&self) -> ExtremumMode {
        self.config.extremum
    }

    pub fn sequence_cap(&self) -> usize {
        self.config.sequence_cap
    }

    /// Every landmark the exercise reads
    pub fn required_joints(&self) -> &[Joint] {
        &self.required
    }

    /// Primary joint angle for this frame
    pub fn primary_angle(&self, frame: &LandmarkFrame) -> Result<f64, GeometryError> {
        self.config.primary.angle(frame, self.config.convention)
    }
}

/// Built-in exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    #[default]
    KneeFlexion,
    Squat,
    BicepCurl,
    ShoulderFlexion,
}

impl ExerciseKind {
    /// Preset definition for the given body side
    pub fn preset(self, side: Side) -> ExerciseConfig {
        match self {
            ExerciseKind::KneeFlexion => presets::knee_flexion(side),
            ExerciseKind::Squat => presets::squat(side),
            ExerciseKind::BicepCurl => presets::bicep_curl(side),
            ExerciseKind::ShoulderFlexion => presets::shoulder_flexion(side),
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExerciseKind::KneeFlexion => "knee_flexion",
            ExerciseKind::Squat => "squat",
            ExerciseKind::BicepCurl => "bicep_curl",
            ExerciseKind::ShoulderFlexion => "shoulder_flexion",
        };
        f.write_str(name)
    }
}
