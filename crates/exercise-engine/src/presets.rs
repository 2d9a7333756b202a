//! Built-in exercise definitions
//!
//! Stage bands tile their span exactly; angles outside the span are the
//! only unclassifiable region.

use pose_geometry::{AngleConvention, Direction, Joint, JointTriple, Side};

use crate::config::ExerciseConfig;
use crate::faults::{FaultCategory, FaultConstraint, Limit, Measurement};
use crate::sequence::{CanonicalPattern, DEFAULT_SEQUENCE_CAP};
use crate::session::ExtremumMode;
use crate::stage::{AngleRange, Stage, StageBand, StageThresholds};

pub const REASON_TRUNK_FLEXED: &str = "trunk too flexed, extend your back";
pub const REASON_TORSO_TILTED: &str = "shoulder-hip misalignment, keep your torso upright";
pub const REASON_SHOULDER_ELEVATED: &str = "scapular elevation detected, lower your shoulder";
pub const REASON_SHOULDER_NOT_VERTICAL: &str = "shoulder-hip misalignment, keep your shoulder above your hip";

/// Minimum hip angle while descending and at the bottom of a squat
const SQUAT_MIN_TRUNK_ANGLE: f64 = 45.0;
/// Maximum torso tilt from vertical during a curl
const CURL_MAX_TORSO_TILT: f64 = 20.0;
/// Shoulder-ear distance may not fall below this share of its baseline
const CURL_MIN_SHOULDER_EAR_RATIO: f64 = 0.8;
/// Maximum torso tilt from vertical during shoulder flexion
const SHOULDER_MAX_TORSO_TILT: f64 = 30.0;

/// Seated knee flexion/extension: 90° bent (start) to a straight leg (peak)
pub fn knee_flexion(side: Side) -> ExerciseConfig {
    ExerciseConfig {
        name: "knee flexion".into(),
        primary: JointTriple::new(Joint::hip(side), Joint::knee(side), Joint::ankle(side)),
        convention: AngleConvention::Included,
        thresholds: StageThresholds::new(vec![
            StageBand::new(Stage::Stage1, AngleRange::closed_open(90.0, 120.0)),
            StageBand::new(Stage::Stage2, AngleRange::closed_open(120.0, 155.0)),
            StageBand::new(Stage::Stage3, AngleRange::closed(155.0, 180.0)),
        ]),
        pattern: CanonicalPattern::standard(),
        constraints: Vec::new(),
        extremum: ExtremumMode::Max,
        sequence_cap: DEFAULT_SEQUENCE_CAP,
    }
}

/// Bodyweight squat: standing (start) to deep knee bend (peak)
pub fn squat(side: Side) -> ExerciseConfig {
    let trunk = Measurement::JointAngle {
        joints: JointTriple::new(Joint::shoulder(side), Joint::hip(side), Joint::knee(side)),
        convention: AngleConvention::Included,
    };
    let trunk_limit = Limit::AtLeast(SQUAT_MIN_TRUNK_ANGLE);

    ExerciseConfig {
        name: "squat".into(),
        primary: JointTriple::new(Joint::hip(side), Joint::knee(side), Joint::ankle(side)),
        convention: AngleConvention::Included,
        thresholds: StageThresholds::new(vec![
            StageBand::new(Stage::Stage1, AngleRange::closed(145.0, 180.0)),
            StageBand::new(Stage::Stage2, AngleRange::closed_open(120.0, 145.0)),
            StageBand::new(Stage::Stage3, AngleRange::closed_open(0.0, 120.0)),
        ]),
        pattern: CanonicalPattern::standard(),
        constraints: vec![
            FaultConstraint::new(FaultCategory::TrunkFlexion, REASON_TRUNK_FLEXED, trunk, trunk_limit)
                .during(&[Stage::Stage2, Stage::Stage3]),
            FaultConstraint::new(FaultCategory::TrunkFlexion, REASON_TRUNK_FLEXED, trunk, trunk_limit)
                .during(&[Stage::Stage1])
                .warn_only(),
        ],
        extremum: ExtremumMode::Min,
        sequence_cap: DEFAULT_SEQUENCE_CAP,
    }
}

/// Standing bicep curl: extended arm (start) to full curl (peak)
///
/// Angles are elbow flexion (straight arm = 0°), so the session extremum is
/// the largest flexion reached, not the smallest included angle.
pub fn bicep_curl(side: Side) -> ExerciseConfig {
    ExerciseConfig {
        name: "bicep curl".into(),
        primary: JointTriple::new(Joint::shoulder(side), Joint::elbow(side), Joint::wrist(side)),
        convention: AngleConvention::Deviation,
        thresholds: StageThresholds::new(vec![
            StageBand::new(Stage::Stage1, AngleRange::closed(0.0, 90.0)),
            StageBand::new(Stage::Stage2, AngleRange::open(90.0, 120.0)),
            StageBand::new(Stage::Stage3, AngleRange::closed(120.0, 180.0)),
        ]),
        pattern: CanonicalPattern::standard(),
        constraints: vec![
            FaultConstraint::new(
                FaultCategory::Alignment,
                REASON_TORSO_TILTED,
                Measurement::Alignment {
                    from: Joint::hip(side),
                    to: Joint::shoulder(side),
                    reference: Direction::Up,
                },
                Limit::AtMost(CURL_MAX_TORSO_TILT),
            ),
            FaultConstraint::new(
                FaultCategory::ScapularElevation,
                REASON_SHOULDER_ELEVATED,
                Measurement::Distance {
                    from: Joint::shoulder(side),
                    to: Joint::ear(side),
                },
                Limit::AtLeastBaselineRatio(CURL_MIN_SHOULDER_EAR_RATIO),
            ),
        ],
        extremum: ExtremumMode::Max,
        sequence_cap: DEFAULT_SEQUENCE_CAP,
    }
}

/// Shoulder flexion: arm at the side (start) to overhead (peak)
pub fn shoulder_flexion(side: Side) -> ExerciseConfig {
    ExerciseConfig {
        name: "shoulder flexion".into(),
        primary: JointTriple::new(Joint::hip(side), Joint::shoulder(side), Joint::elbow(side)),
        convention: AngleConvention::Included,
        thresholds: StageThresholds::new(vec![
            StageBand::new(Stage::Stage1, AngleRange::closed_open(0.0, 60.0)),
            StageBand::new(Stage::Stage2, AngleRange::closed_open(60.0, 120.0)),
            StageBand::new(Stage::Stage3, AngleRange::closed(120.0, 180.0)),
        ]),
        pattern: CanonicalPattern::standard(),
        constraints: vec![FaultConstraint::new(
            FaultCategory::Alignment,
            REASON_SHOULDER_NOT_VERTICAL,
            Measurement::Alignment {
                from: Joint::hip(side),
                to: Joint::shoulder(side),
                reference: Direction::Up,
            },
            Limit::AtMost(SHOULDER_MAX_TORSO_TILT),
        )],
        extremum: ExtremumMode::Max,
        sequence_cap: DEFAULT_SEQUENCE_CAP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knee_reference_angles() {
        let table = knee_flexion(Side::Left).thresholds;
        assert_eq!(table.classify(100.0), Some(Stage::Stage1));
        assert_eq!(table.classify(130.0), Some(Stage::Stage2));
        assert_eq!(table.classify(165.0), Some(Stage::Stage3));
        assert_eq!(table.classify(135.0), Some(Stage::Stage2));
        assert_eq!(table.classify(95.0), Some(Stage::Stage1));
        assert_eq!(table.classify(80.0), None);
    }

    #[test]
    fn test_squat_boundaries_have_no_gaps() {
        let table = squat(Side::Right).thresholds;
        assert_eq!(table.classify(144.5), Some(Stage::Stage2));
        assert_eq!(table.classify(119.5), Some(Stage::Stage3));
        assert_eq!(table.classify(145.0), Some(Stage::Stage1));
    }

    #[test]
    fn test_curl_boundaries_do_not_overlap() {
        let table = bicep_curl(Side::Left).thresholds;
        assert_eq!(table.classify(90.0), Some(Stage::Stage1));
        assert_eq!(table.classify(90.5), Some(Stage::Stage2));
        assert_eq!(table.classify(120.0), Some(Stage::Stage3));
    }

    #[test]
    fn test_presets_follow_side() {
        let right = squat(Side::Right);
        assert_eq!(right.primary.medial, Joint::RightKnee);
        let left = shoulder_flexion(Side::Left);
        assert_eq!(left.primary.medial, Joint::LeftShoulder);
    }
}
