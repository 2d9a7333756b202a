//! Pose Geometry
//!
//! Pure geometric features extracted from 2-D body landmarks:
//! - Joint angles from proximal/medial/distal landmark triples
//! - Alignment of a body segment against a fixed reference direction
//! - Planar distances between landmarks

pub mod angles;
pub mod landmark;

pub use angles::{alignment_angle, joint_angle, planar_distance, AngleConvention, Direction, JointTriple};
pub use landmark::{Joint, LandmarkFrame, Point2, Side};

use thiserror::Error;

/// Geometry error types
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// A segment has zero length or a coordinate is not finite
    #[error("Degenerate geometry: segment has zero length or non-finite coordinates")]
    DegenerateGeometry,

    #[error("Landmark missing from frame: {0:?}")]
    MissingLandmark(Joint),
}
