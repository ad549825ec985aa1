//! ONNX-backed `DetectorAdapter`.

use std::sync::Arc;

use tracing::info;

use skate_models::RgbFrame;
use skate_scoring::{DetectorAdapter, FrameDetections, ScoringError, ScoringResult};

use super::board::{BoardDetector, BoardDetectorConfig};
use super::pose::{PoseDetector, PoseDetectorConfig};
use super::yolo::frame_to_image;
use crate::error::MediaResult;

/// Model paths and thresholds for both detectors.
#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    pub pose: PoseDetectorConfig,
    pub board: BoardDetectorConfig,
}

impl DetectorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pose: PoseDetectorConfig {
                model_path: std::env::var("POSE_MODEL_PATH")
                    .unwrap_or(defaults.pose.model_path),
                confidence_threshold: std::env::var("POSE_CONFIDENCE_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.pose.confidence_threshold),
                input_size: defaults.pose.input_size,
            },
            board: BoardDetectorConfig {
                model_path: std::env::var("BOARD_MODEL_PATH")
                    .unwrap_or(defaults.board.model_path),
                confidence_threshold: std::env::var("BOARD_CONFIDENCE_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.board.confidence_threshold),
                input_size: defaults.board.input_size,
                class_id: std::env::var("BOARD_CLASS_ID")
                    .ok()
                    .and_then(|s| s.parse().ok()),
            },
        }
    }
}

/// Runs the pose and board models on each frame.
///
/// Both sessions are created once in [`OnnxDetectorAdapter::load`] and reused
/// for every frame of every video.
pub struct OnnxDetectorAdapter {
    pose: PoseDetector,
    board: BoardDetector,
}

impl OnnxDetectorAdapter {
    /// Load both models.
    pub fn load(config: DetectorConfig) -> MediaResult<Self> {
        let pose = PoseDetector::new(config.pose)?;
        let board = BoardDetector::new(config.board)?;
        info!("Detector models loaded");
        Ok(Self { pose, board })
    }

    /// Load both models behind an `Arc` for sharing across tasks.
    pub fn load_shared(config: DetectorConfig) -> MediaResult<Arc<Self>> {
        Self::load(config).map(Arc::new)
    }
}

impl DetectorAdapter for OnnxDetectorAdapter {
    fn detect(&self, frame: &RgbFrame) -> ScoringResult<FrameDetections> {
        let img = frame_to_image(frame).map_err(ScoringError::from)?;
        let keypoints = self.pose.detect_image(&img)?;
        // No point running the board model without a skater.
        if keypoints.is_none() {
            return Ok(FrameDetections::none());
        }
        let board = self.board.detect_image(&img)?;
        Ok(FrameDetections::new(keypoints, board))
    }
}
