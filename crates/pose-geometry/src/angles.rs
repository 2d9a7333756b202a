//! Joint and alignment angle calculation
//!
//! All angles are in degrees. Joint angles use the dot product formula
//! `cos(θ) = (v1 · v2) / (|v1| × |v2|)` over the segment vectors
//! proximal→medial and medial→distal.

use serde::{Deserialize, Serialize};

use crate::landmark::{Joint, LandmarkFrame, Point2};
use crate::GeometryError;

/// Segments shorter than this (pixels) are treated as degenerate
const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Which end of the 0..180 range a straight limb maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleConvention {
    /// Raw angle between the two segment vectors (straight limb = 0°)
    Deviation,
    /// 180° supplement of the raw angle (straight limb = 180°)
    #[default]
    Included,
}

/// Fixed reference direction in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector (y grows downward)
    pub fn unit(self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// Three landmarks defining a joint angle, measured at `medial`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointTriple {
    pub proximal: Joint,
    pub medial: Joint,
    pub distal: Joint,
}

impl JointTriple {
    pub fn new(proximal: Joint, medial: Joint, distal: Joint) -> Self {
        Self {
            proximal,
            medial,
            distal,
        }
    }

    pub fn joints(&self) -> [Joint; 3] {
        [self.proximal, self.medial, self.distal]
    }

    /// Joint angle for this triple in the given frame
    pub fn angle(&self, frame: &LandmarkFrame, convention: AngleConvention) -> Result<f64, GeometryError> {
        joint_angle(
            frame.point(self.proximal)?,
            frame.point(self.medial)?,
            frame.point(self.distal)?,
            convention,
        )
    }
}

fn magnitude(v: (f64, f64)) -> f64 {
    v.0.hypot(v.1)
}

/// Angle at `medial` between segments proximal→medial and medial→distal
pub fn joint_angle(
    proximal: Point2,
    medial: Point2,
    distal: Point2,
    convention: AngleConvention,
) -> Result<f64, GeometryError> {
    if !(proximal.is_finite() && medial.is_finite() && distal.is_finite()) {
        return Err(GeometryError::DegenerateGeometry);
    }

    let v1 = proximal.to(medial);
    let v2 = medial.to(distal);

    let mag1 = magnitude(v1);
    let mag2 = magnitude(v2);
    if mag1 < MIN_SEGMENT_LENGTH || mag2 < MIN_SEGMENT_LENGTH {
        return Err(GeometryError::DegenerateGeometry);
    }

    // Clamp guards against |cos| creeping past 1.0 on collinear input
    let cos_angle = ((v1.0 * v2.0 + v1.1 * v2.1) / (mag1 * mag2)).clamp(-1.0, 1.0);
    let raw = cos_angle.acos().to_degrees();

    Ok(match convention {
        AngleConvention::Deviation => raw,
        AngleConvention::Included => 180.0 - raw,
    })
}

/// Angle between the segment `from`→`to` and a reference direction
pub fn alignment_angle(from: Point2, to: Point2, reference: Direction) -> Result<f64, GeometryError> {
    if !(from.is_finite() && to.is_finite()) {
        return Err(GeometryError::DegenerateGeometry);
    }

    let v = from.to(to);
    let mag = magnitude(v);
    if mag < MIN_SEGMENT_LENGTH {
        return Err(GeometryError::DegenerateGeometry);
    }

    let r = reference.unit();
    let cos_angle = ((v.0 * r.0 + v.1 * r.1) / mag).clamp(-1.0, 1.0);
    Ok(cos_angle.acos().to_degrees())
}

/// Euclidean distance between two landmarks
pub fn planar_distance(a: Point2, b: Point2) -> Result<f64, GeometryError> {
    if !(a.is_finite() && b.is_finite()) {
        return Err(GeometryError::DegenerateGeometry);
    }
    Ok(magnitude(a.to(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn test_straight_limb() {
        let (hip, knee, ankle) = (p(100.0, 100.0), p(100.0, 200.0), p(100.0, 300.0));

        let included = joint_angle(hip, knee, ankle, AngleConvention::Included).unwrap();
        let deviation = joint_angle(hip, knee, ankle, AngleConvention::Deviation).unwrap();

        assert!((included - 180.0).abs() < 1e-9);
        assert!(deviation.abs() < 1e-9);
    }

    #[test]
    fn test_right_angle() {
        let angle = joint_angle(p(0.0, 0.0), p(50.0, 0.0), p(50.0, 50.0), AngleConvention::Included).unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_folded_limb() {
        // Distal point folds straight back onto the proximal segment
        let angle = joint_angle(p(0.0, 0.0), p(10.0, 0.0), p(0.0, 0.0), AngleConvention::Included).unwrap();
        assert!(angle.abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_segments() {
        let a = p(10.0, 10.0);
        assert_eq!(
            joint_angle(a, a, p(20.0, 20.0), AngleConvention::Included),
            Err(GeometryError::DegenerateGeometry)
        );
        assert_eq!(
            joint_angle(p(0.0, 0.0), a, a, AngleConvention::Deviation),
            Err(GeometryError::DegenerateGeometry)
        );
        assert_eq!(
            joint_angle(p(f64::NAN, 0.0), a, p(0.0, 0.0), AngleConvention::Included),
            Err(GeometryError::DegenerateGeometry)
        );
    }

    #[test]
    fn test_alignment_against_vertical() {
        // Shoulder directly above hip
        let upright = alignment_angle(p(100.0, 300.0), p(100.0, 100.0), Direction::Up).unwrap();
        assert!(upright.abs() < 1e-9);

        // 45° forward lean
        let lean = alignment_angle(p(100.0, 300.0), p(200.0, 200.0), Direction::Up).unwrap();
        assert!((lean - 45.0).abs() < 1e-9);

        assert_eq!(
            alignment_angle(p(1.0, 1.0), p(1.0, 1.0), Direction::Up),
            Err(GeometryError::DegenerateGeometry)
        );
    }

    #[test]
    fn test_planar_distance() {
        assert!((planar_distance(p(0.0, 0.0), p(3.0, 4.0)).unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(planar_distance(p(2.0, 2.0), p(2.0, 2.0)), Ok(0.0));
        assert!(planar_distance(p(f64::INFINITY, 0.0), p(0.0, 0.0)).is_err());
    }

    #[test]
    fn test_triple_from_frame() {
        let frame = LandmarkFrame::new(0)
            .with(Joint::LeftShoulder, [0.0, 0.0])
            .with(Joint::LeftElbow, [0.0, 100.0])
            .with(Joint::LeftWrist, [100.0, 100.0]);
        let triple = JointTriple::new(Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist);

        let angle = triple.angle(&frame, AngleConvention::Deviation).unwrap();
        assert!((angle - 90.0).abs() < 1e-9);

        let missing = JointTriple::new(Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftEar);
        assert_eq!(
            missing.angle(&frame, AngleConvention::Deviation),
            Err(GeometryError::MissingLandmark(Joint::LeftEar))
        );
    }

    proptest! {
        #[test]
        fn prop_angle_within_range(
            ax in -1000.0f64..1000.0, ay in -1000.0f64..1000.0,
            bx in -1000.0f64..1000.0, by in -1000.0f64..1000.0,
            cx in -1000.0f64..1000.0, cy in -1000.0f64..1000.0,
        ) {
            if let Ok(angle) = joint_angle(p(ax, ay), p(bx, by), p(cx, cy), AngleConvention::Included) {
                prop_assert!((0.0..=180.0).contains(&angle));
            }
        }

        #[test]
        fn prop_conventions_are_supplementary(
            ax in -1000.0f64..1000.0, ay in -1000.0f64..1000.0,
            cx in -1000.0f64..1000.0, cy in -1000.0f64..1000.0,
        ) {
            let medial = p(0.5, 0.5);
            let inc = joint_angle(p(ax, ay), medial, p(cx, cy), AngleConvention::Included);
            let dev = joint_angle(p(ax, ay), medial, p(cx, cy), AngleConvention::Deviation);
            if let (Ok(inc), Ok(dev)) = (inc, dev) {
                prop_assert!((inc + dev - 180.0).abs() < 1e-9);
            }
        }
    }
}
