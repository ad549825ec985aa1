//! Body-landmark schema and keypoint sets.
//!
//! Pose detectors emit the 17-point COCO layout. Only shoulders, hips and
//! ankles feed the trick features, but the whole set is kept so the schema
//! check stays meaningful.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// COCO keypoint indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum Landmark {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl Landmark {
    /// Number of landmarks in the schema.
    pub const COUNT: usize = 17;

    /// Position of this landmark in a keypoint set.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points.
    pub fn midpoint(&self, other: &Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Ordered keypoints for one detected person in one frame.
///
/// The set is not length-checked on construction: a detector may hand back a
/// truncated list, and the feature extractor is the one that rejects it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct KeypointSet {
    pub points: Vec<Point2>,
}

impl KeypointSet {
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Number of landmarks present.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether every schema index is addressable.
    pub fn is_complete(&self) -> bool {
        self.points.len() >= Landmark::COUNT
    }

    /// Get a landmark, if present.
    pub fn get(&self, landmark: Landmark) -> Option<&Point2> {
        self.points.get(landmark.index())
    }

    /// Apply `f` to every point, producing a new set.
    pub fn map(&self, f: impl Fn(&Point2) -> Point2) -> KeypointSet {
        KeypointSet::new(self.points.iter().map(f).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_indices() {
        assert_eq!(Landmark::LeftShoulder.index(), 5);
        assert_eq!(Landmark::RightHip.index(), 12);
        assert_eq!(Landmark::RightAnkle.index(), 16);
        assert_eq!(Landmark::COUNT, 17);
    }

    #[test]
    fn test_point_helpers() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
        assert_eq!(a.midpoint(&b), Point2::new(1.5, 2.0));
    }

    #[test]
    fn test_keypoint_set_completeness() {
        let short = KeypointSet::new(vec![Point2::default(); 16]);
        assert!(!short.is_complete());
        assert!(short.get(Landmark::RightAnkle).is_none());

        let full = KeypointSet::new(vec![Point2::default(); 17]);
        assert!(full.is_complete());
        assert!(full.get(Landmark::RightAnkle).is_some());
    }
}
