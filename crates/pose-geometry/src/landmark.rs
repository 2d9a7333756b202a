//! Landmark frame types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// Body side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Left,
    Right,
}

/// Body keypoints used by the exercise engine (MediaPipe Pose topology)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    /// All supported joints
    pub const ALL: [Joint; 15] = [
        Joint::Nose,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Index of this joint in the 33-point MediaPipe Pose landmark array
    pub fn mediapipe_index(self) -> usize {
        match self {
            Joint::Nose => 0,
            Joint::LeftEar => 7,
            Joint::RightEar => 8,
            Joint::LeftShoulder => 11,
            Joint::RightShoulder => 12,
            Joint::LeftElbow => 13,
            Joint::RightElbow => 14,
            Joint::LeftWrist => 15,
            Joint::RightWrist => 16,
            Joint::LeftHip => 23,
            Joint::RightHip => 24,
            Joint::LeftKnee => 25,
            Joint::RightKnee => 26,
            Joint::LeftAnkle => 27,
            Joint::RightAnkle => 28,
        }
    }

    /// Joint for a MediaPipe landmark index, if it is one we track
    pub fn from_mediapipe_index(index: usize) -> Option<Joint> {
        Self::ALL.into_iter().find(|j| j.mediapipe_index() == index)
    }

    pub fn ear(side: Side) -> Joint {
        match side {
            Side::Left => Joint::LeftEar,
            Side::Right => Joint::RightEar,
        }
    }

    pub fn shoulder(side: Side) -> Joint {
        match side {
            Side::Left => Joint::LeftShoulder,
            Side::Right => Joint::RightShoulder,
        }
    }

    pub fn elbow(side: Side) -> Joint {
        match side {
            Side::Left => Joint::LeftElbow,
            Side::Right => Joint::RightElbow,
        }
    }

    pub fn wrist(side: Side) -> Joint {
        match side {
            Side::Left => Joint::LeftWrist,
            Side::Right => Joint::RightWrist,
        }
    }

    pub fn hip(side: Side) -> Joint {
        match side {
            Side::Left => Joint::LeftHip,
            Side::Right => Joint::RightHip,
        }
    }

    pub fn knee(side: Side) -> Joint {
        match side {
            Side::Left => Joint::LeftKnee,
            Side::Right => Joint::RightKnee,
        }
    }

    pub fn ankle(side: Side) -> Joint {
        match side {
            Side::Left => Joint::LeftAnkle,
            Side::Right => Joint::RightAnkle,
        }
    }
}

/// 2-D point in pixel space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `self` to `other`
    pub fn to(self, other: Point2) -> (f64, f64) {
        (other.x - self.x, other.y - self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(p: [f64; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

/// Landmarks detected for a single video frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Capture timestamp (milliseconds)
    pub timestamp_ms: u64,
    /// Detected joints in pixel coordinates
    pub points: HashMap<Joint, Point2>,
}

impl LandmarkFrame {
    pub fn new(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            points: HashMap::new(),
        }
    }

    /// Frame where the pose source could not deliver landmarks
    pub fn incomplete(timestamp_ms: u64) -> Self {
        Self::new(timestamp_ms)
    }

    /// Build a frame from a MediaPipe-ordered array of normalized coordinates.
    ///
    /// Coordinates are scaled by the frame dimensions into pixel space.
    /// Entries that are `None` or belong to joints we do not track are dropped.
    pub fn from_normalized(
        timestamp_ms: u64,
        width: f64,
        height: f64,
        landmarks: &[Option<[f64; 2]>],
    ) -> Self {
        let points = landmarks
            .iter()
            .enumerate()
            .filter_map(|(idx, lm)| {
                let joint = Joint::from_mediapipe_index(idx)?;
                let [x, y] = (*lm)?;
                Some((joint, Point2::new(x * width, y * height)))
            })
            .collect();

        Self { timestamp_ms, points }
    }

    /// Builder-style insert
    pub fn with(mut self, joint: Joint, point: impl Into<Point2>) -> Self {
        self.points.insert(joint, point.into());
        self
    }

    pub fn get(&self, joint: Joint) -> Option<Point2> {
        self.points.get(&joint).copied()
    }

    /// Look up a landmark, failing if it was not detected
    pub fn point(&self, joint: Joint) -> Result<Point2, GeometryError> {
        self.get(joint).ok_or(GeometryError::MissingLandmark(joint))
    }

    /// Check that every listed joint is present
    pub fn require(&self, joints: &[Joint]) -> Result<(), GeometryError> {
        match joints.iter().find(|j| !self.points.contains_key(j)) {
            Some(&missing) => Err(GeometryError::MissingLandmark(missing)),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mediapipe_index_roundtrip() {
        for joint in Joint::ALL {
            assert_eq!(Joint::from_mediapipe_index(joint.mediapipe_index()), Some(joint));
        }
        assert_eq!(Joint::from_mediapipe_index(1), None);
        assert_eq!(Joint::from_mediapipe_index(33), None);
    }

    #[test]
    fn test_from_normalized_scales_to_pixels() {
        let mut landmarks = vec![None; 33];
        landmarks[23] = Some([0.5, 0.25]);
        landmarks[25] = Some([0.5, 0.5]);
        landmarks[2] = Some([0.1, 0.1]); // untracked joint

        let frame = LandmarkFrame::from_normalized(42, 640.0, 480.0, &landmarks);

        assert_eq!(frame.timestamp_ms, 42);
        assert_eq!(frame.points.len(), 2);
        assert_eq!(frame.get(Joint::LeftHip), Some(Point2::new(320.0, 120.0)));
        assert_eq!(frame.get(Joint::LeftKnee), Some(Point2::new(320.0, 240.0)));
    }

    #[test]
    fn test_require_reports_first_missing() {
        let frame = LandmarkFrame::new(0)
            .with(Joint::RightHip, [1.0, 1.0])
            .with(Joint::RightKnee, [1.0, 2.0]);

        assert!(frame.require(&[Joint::RightHip, Joint::RightKnee]).is_ok());
        assert_eq!(
            frame.require(&[Joint::RightHip, Joint::RightAnkle, Joint::Nose]),
            Err(GeometryError::MissingLandmark(Joint::RightAnkle))
        );
        assert!(LandmarkFrame::incomplete(5).is_empty());
    }

    #[test]
    fn test_side_helpers() {
        assert_eq!(Joint::knee(Side::Left), Joint::LeftKnee);
        assert_eq!(Joint::knee(Side::Right), Joint::RightKnee);
        assert_eq!(Joint::ear(Side::Right), Joint::RightEar);
    }
}
