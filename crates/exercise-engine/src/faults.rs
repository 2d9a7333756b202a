//! Posture constraints and per-attempt form fault accumulation

use std::fmt;

use pose_geometry::{
    alignment_angle, planar_distance, AngleConvention, Direction, GeometryError, Joint,
    JointTriple, LandmarkFrame,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::stage::Stage;

/// Posture fault category (one notification channel each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    /// Body segment drifted away from its reference direction
    Alignment,
    /// Trunk folded too far forward
    TrunkFlexion,
    /// Shoulder shrugged toward the ear
    ScapularElevation,
}

impl fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultCategory::Alignment => "alignment",
            FaultCategory::TrunkFlexion => "trunk_flexion",
            FaultCategory::ScapularElevation => "scapular_elevation",
        };
        f.write_str(name)
    }
}

/// Auxiliary value a constraint is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measurement {
    JointAngle {
        joints: JointTriple,
        convention: AngleConvention,
    },
    Alignment {
        from: Joint,
        to: Joint,
        reference: Direction,
    },
    Distance {
        from: Joint,
        to: Joint,
    },
}

impl Measurement {
    /// Landmarks this measurement reads
    pub fn joints(&self) -> Vec<Joint> {
        match *self {
            Measurement::JointAngle { joints, .. } => joints.joints().to_vec(),
            Measurement::Alignment { from, to, .. } | Measurement::Distance { from, to } => vec![from, to],
        }
    }

    pub fn measure(&self, frame: &LandmarkFrame) -> Result<f64, GeometryError> {
        match *self {
            Measurement::JointAngle { joints, convention } => joints.angle(frame, convention),
            Measurement::Alignment { from, to, reference } => {
                alignment_angle(frame.point(from)?, frame.point(to)?, reference)
            }
            Measurement::Distance { from, to } => planar_distance(frame.point(from)?, frame.point(to)?),
        }
    }
}

/// Threshold a measurement must respect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    AtMost(f64),
    AtLeast(f64),
    /// Must stay at or above `ratio` × the session baseline
    AtLeastBaselineRatio(f64),
}

/// What a violated constraint does to the attempt in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintEffect {
    /// Recorded as a form fault; invalidates the repetition
    #[default]
    Invalidate,
    /// Surfaced to the user only
    Warn,
}

/// Independent posture rule checked on every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultConstraint {
    pub category: FaultCategory,
    pub reason: String,
    pub measurement: Measurement,
    pub limit: Limit,
    /// Only checked while the primary angle is in one of these stages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<Stage>>,
    #[serde(default)]
    pub effect: ConstraintEffect,
}

impl FaultConstraint {
    pub fn new(category: FaultCategory, reason: impl Into<String>, measurement: Measurement, limit: Limit) -> Self {
        Self {
            category,
            reason: reason.into(),
            measurement,
            limit,
            stages: None,
            effect: ConstraintEffect::Invalidate,
        }
    }

    pub fn during(mut self, stages: &[Stage]) -> Self {
        self.stages = Some(stages.to_vec());
        self
    }

    pub fn warn_only(mut self) -> Self {
        self.effect = ConstraintEffect::Warn;
        self
    }

    fn applies_to(&self, stage: Option<Stage>) -> bool {
        match (&self.stages, stage) {
            (None, _) => true,
            (Some(stages), Some(stage)) => stages.contains(&stage),
            (Some(_), None) => false,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |detail| ConfigError::InvalidConstraint {
            reason: self.reason.clone(),
            detail,
        };

        if self.reason.trim().is_empty() {
            return Err(invalid("reason must not be empty"));
        }
        match self.limit {
            Limit::AtMost(v) | Limit::AtLeast(v) if !v.is_finite() => Err(invalid("limit must be finite")),
            Limit::AtLeastBaselineRatio(r) if !(r > 0.0 && r <= 1.0) => {
                Err(invalid("baseline ratio must be in (0, 1]"))
            }
            _ if self.stages.as_ref().is_some_and(|s| s.is_empty()) => {
                Err(invalid("stage filter must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// One form fault recorded against the current attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFault {
    pub category: FaultCategory,
    pub reason: String,
}

/// Deduplicated faults for the attempt in progress, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFaults {
    faults: Vec<FormFault>,
}

impl FormFaults {
    /// Record a fault; returns `false` if the same reason is already present
    pub fn insert(&mut self, fault: FormFault) -> bool {
        if self.faults.iter().any(|f| f.reason == fault.reason) {
            return false;
        }
        self.faults.push(fault);
        true
    }

    pub fn reasons(&self) -> Vec<String> {
        self.faults.iter().map(|f| f.reason.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormFault> {
        self.faults.iter()
    }

    pub fn len(&self) -> usize {
        self.faults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn clear(&mut self) {
        self.faults.clear();
    }
}

/// Per-constraint baseline values, captured on first successful measurement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    values: Vec<Option<f64>>,
}

impl Baselines {
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    fn capture(&mut self, index: usize, value: f64) {
        if self.values.len() <= index {
            self.values.resize(index + 1, None);
        }
        self.values[index] = Some(value);
    }
}

/// Measurements taken for one frame, indexed like the constraint list.
/// `None` marks a measurement that could not be taken this frame.
pub type AuxiliaryMeasurements = Vec<Option<f64>>;

/// A constraint violated on the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub category: FaultCategory,
    pub reason: String,
    pub effect: ConstraintEffect,
}

/// Take every constraint's measurement from the frame
pub fn measure_all(constraints: &[FaultConstraint], frame: &LandmarkFrame) -> AuxiliaryMeasurements {
    constraints
        .iter()
        .map(|c| match c.measurement.measure(frame) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Skipping '{}' this frame: {}", c.reason, e);
                None
            }
        })
        .collect()
}

/// Evaluate constraints against this frame's measurements.
///
/// Baseline-relative limits capture their baseline on the first
/// successful measurement and never fire on that frame.
pub fn evaluate(
    constraints: &[FaultConstraint],
    measurements: &[Option<f64>],
    stage: Option<Stage>,
    baselines: &mut Baselines,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (index, constraint) in constraints.iter().enumerate() {
        let Some(value) = measurements.get(index).copied().flatten() else {
            continue;
        };

        let violated = match constraint.limit {
            Limit::AtMost(max) => value > max,
            Limit::AtLeast(min) => value < min,
            Limit::AtLeastBaselineRatio(ratio) => match baselines.get(index) {
                Some(baseline) => value < baseline * ratio,
                None => {
                    debug!("Captured baseline {:.2} for '{}'", value, constraint.reason);
                    baselines.capture(index, value);
                    false
                }
            },
        };

        if violated && constraint.applies_to(stage) {
            violations.push(Violation {
                category: constraint.category,
                reason: constraint.reason.clone(),
                effect: constraint.effect,
            });
        }
    }

    violations
}
