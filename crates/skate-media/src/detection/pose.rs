//! YOLOv8-pose person keypoint detection.
//!
//! Output layout per candidate: `cx, cy, w, h, person_score`, then 17 triples
//! of `(x, y, visibility)` in model input coordinates.

use std::path::Path;
use std::sync::Mutex;

use image::{DynamicImage, GenericImageView};
use ndarray::Array2;
use ort::session::Session;
use tracing::info;

use skate_models::{KeypointSet, Landmark, Point2};

use super::session::create_session;
use super::yolo::{best_candidate, preprocess, run_inference, InputScale, YoloOutput};
use crate::error::{MediaError, MediaResult};

const BOX_ROWS: usize = 4;
const SCORE_ROW: usize = 4;
const KEYPOINT_STRIDE: usize = 3;

/// Rows a pose output must carry.
pub const POSE_ROWS: usize = BOX_ROWS + 1 + Landmark::COUNT * KEYPOINT_STRIDE;

/// Configuration for the pose detector.
#[derive(Debug, Clone)]
pub struct PoseDetectorConfig {
    /// Path to ONNX model file
    pub model_path: String,
    /// Minimum person score
    pub confidence_threshold: f32,
    /// Input image size (model expects square input)
    pub input_size: u32,
}

impl Default for PoseDetectorConfig {
    fn default() -> Self {
        Self {
            model_path: "models/pose/yolov8n-pose.onnx".to_string(),
            confidence_threshold: 0.25,
            input_size: 640,
        }
    }
}

/// Person keypoint detector. Loaded once, shared across frames and videos.
pub struct PoseDetector {
    session: Mutex<Session>,
    config: PoseDetectorConfig,
}

impl PoseDetector {
    pub fn new(config: PoseDetectorConfig) -> MediaResult<Self> {
        let session = Mutex::new(create_session(Path::new(&config.model_path), "pose")?);
        info!(
            model_path = %config.model_path,
            input_size = config.input_size,
            "Pose detector initialized"
        );
        Ok(Self { session, config })
    }

    /// Keypoints of the most confident person, in source pixels.
    pub fn detect_image(&self, img: &DynamicImage) -> MediaResult<Option<KeypointSet>> {
        let (width, height) = img.dimensions();
        let input = preprocess(img, self.config.input_size)?;
        let output = run_inference(&self.session, input)?;
        decode_pose(
            &output,
            self.config.confidence_threshold,
            InputScale::new(self.config.input_size, width, height),
        )
    }

    pub fn config(&self) -> &PoseDetectorConfig {
        &self.config
    }
}

/// Pick the best person and map its keypoints back to source pixels.
pub fn decode_pose(
    output: &YoloOutput,
    threshold: f32,
    scale: InputScale,
) -> MediaResult<Option<KeypointSet>> {
    if output.rows() < POSE_ROWS {
        return Err(MediaError::detection_failed(format!(
            "Pose output has {} rows, expected at least {}",
            output.rows(),
            POSE_ROWS
        )));
    }

    let candidates: Array2<f32> = output.candidates()?;
    let Some((best, _)) = best_candidate(&candidates, threshold, |row| row[SCORE_ROW]) else {
        return Ok(None);
    };

    let row = candidates.row(best);
    let points = (0..Landmark::COUNT)
        .map(|k| {
            let base = BOX_ROWS + 1 + k * KEYPOINT_STRIDE;
            let (x, y) = scale.point(row[base], row[base + 1]);
            Point2::new(x, y)
        })
        .collect();

    Ok(Some(KeypointSet::new(points)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a `[POSE_ROWS, n]` tensor from per-candidate rows.
    fn tensor(candidates: &[Vec<f32>]) -> YoloOutput {
        let n = candidates.len();
        let mut data = vec![0.0f32; POSE_ROWS * n];
        for (i, cand) in candidates.iter().enumerate() {
            for (r, v) in cand.iter().enumerate() {
                data[r * n + i] = *v;
            }
        }
        YoloOutput::from_raw(&[1, POSE_ROWS, n], data).unwrap()
    }

    fn candidate(score: f32, offset: f32) -> Vec<f32> {
        let mut row = vec![100.0, 100.0, 50.0, 80.0, score];
        for k in 0..Landmark::COUNT {
            row.extend([offset + k as f32, offset + 2.0 * k as f32, 0.9]);
        }
        row
    }

    #[test]
    fn test_default_config() {
        let config = PoseDetectorConfig::default();
        assert_eq!(config.input_size, 640);
        assert_eq!(POSE_ROWS, 56);
    }

    #[test]
    fn test_decode_picks_most_confident_person() {
        let output = tensor(&[candidate(0.4, 0.0), candidate(0.8, 100.0), candidate(0.1, 200.0)]);
        let keypoints = decode_pose(&output, 0.25, InputScale::new(640, 1280, 640))
            .unwrap()
            .unwrap();

        assert!(keypoints.is_complete());
        let ankle = keypoints.get(Landmark::LeftAnkle).unwrap();
        // x scaled by 2, y by 1
        assert!((ankle.x - 2.0 * (100.0 + 15.0)).abs() < 1e-4);
        assert!((ankle.y - (100.0 + 30.0)).abs() < 1e-4);
    }

    #[test]
    fn test_decode_below_threshold() {
        let output = tensor(&[candidate(0.1, 0.0)]);
        assert!(decode_pose(&output, 0.25, InputScale::new(640, 640, 640))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decode_rejects_short_output() {
        let output = YoloOutput::from_raw(&[1, 6, 1], vec![0.0; 6]).unwrap();
        assert!(decode_pose(&output, 0.25, InputScale::new(640, 640, 640)).is_err());
    }
}
