//! Per-frame signals and per-video feature summaries.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signals derived from one frame that had both a person and a board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameSignal {
    /// Mean ankle-to-board-center distance (pixels, >= 0)
    pub distance: f64,
    /// Board orientation in degrees, (-180, 180]
    pub board_angle: f64,
    /// Torso orientation in degrees, (-180, 180]
    pub torso_angle: f64,
}

impl FrameSignal {
    pub fn new(distance: f64, board_angle: f64, torso_angle: f64) -> Self {
        Self {
            distance,
            board_angle,
            torso_angle,
        }
    }
}

/// Statistical digest of one video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoFeatureSummary {
    pub mean_distance: f64,
    pub std_distance: f64,
    pub std_board_angle: f64,
    pub std_torso_angle: f64,
    pub airtime_seconds: f64,
}

impl VideoFeatureSummary {
    /// Value of a single feature.
    pub fn feature(&self, name: FeatureName) -> f64 {
        match name {
            FeatureName::MeanDistance => self.mean_distance,
            FeatureName::StdDistance => self.std_distance,
            FeatureName::StdBoardAngle => self.std_board_angle,
            FeatureName::StdTorsoAngle => self.std_torso_angle,
            FeatureName::Airtime => self.airtime_seconds,
        }
    }
}

/// The five features compared by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    MeanDistance,
    StdDistance,
    StdBoardAngle,
    StdTorsoAngle,
    Airtime,
}

impl FeatureName {
    /// All features, in persisted order.
    pub const ALL: [FeatureName; 5] = [
        FeatureName::MeanDistance,
        FeatureName::StdDistance,
        FeatureName::StdBoardAngle,
        FeatureName::StdTorsoAngle,
        FeatureName::Airtime,
    ];

    /// Returns the feature name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::MeanDistance => "mean_distance",
            FeatureName::StdDistance => "std_distance",
            FeatureName::StdBoardAngle => "std_board_angle",
            FeatureName::StdTorsoAngle => "std_torso_angle",
            FeatureName::Airtime => "airtime",
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Frame accounting for one processed video.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct VideoStats {
    /// Frames read from the source
    pub frames_total: u64,
    /// Frames that produced a frame signal
    pub frames_detected: u64,
    /// Frames missing a person, a board, or both
    pub frames_without_detection: u64,
    /// Frames whose keypoint set violated the landmark schema
    pub frames_insufficient_landmarks: u64,
    /// Frames the detector failed on
    pub frames_detector_failed: u64,
    /// Airborne frames counted by the airtime tracker
    pub airborne_frames: u64,
    /// Frame rate used for airtime conversion
    pub frame_rate: f64,
}

impl VideoStats {
    /// Fraction of read frames that produced a signal.
    pub fn detection_ratio(&self) -> f64 {
        if self.frames_total == 0 {
            0.0
        } else {
            self.frames_detected as f64 / self.frames_total as f64
        }
    }
}
