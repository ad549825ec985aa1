//! YOLOv8 skateboard detection.

use std::path::Path;
use std::sync::Mutex;

use image::{DynamicImage, GenericImageView};
use ort::session::Session;
use tracing::info;

use skate_models::BoardBox;

use super::session::create_session;
use super::yolo::{best_candidate, preprocess, run_inference, InputScale, YoloOutput};
use crate::error::{MediaError, MediaResult};

/// COCO class id of "skateboard".
pub const COCO_SKATEBOARD_CLASS: usize = 36;

/// Configuration for the board detector.
#[derive(Debug, Clone)]
pub struct BoardDetectorConfig {
    /// Path to ONNX model file
    pub model_path: String,
    /// Minimum class score
    pub confidence_threshold: f32,
    /// Input image size (model expects square input)
    pub input_size: u32,
    /// Class to accept. `None` accepts any class, for single-class board models.
    pub class_id: Option<usize>,
}

impl Default for BoardDetectorConfig {
    fn default() -> Self {
        Self {
            model_path: "models/board/skateboard.onnx".to_string(),
            confidence_threshold: 0.25,
            input_size: 640,
            class_id: None,
        }
    }
}

/// Skateboard box detector. Loaded once, shared across frames and videos.
pub struct BoardDetector {
    session: Mutex<Session>,
    config: BoardDetectorConfig,
}

impl BoardDetector {
    pub fn new(config: BoardDetectorConfig) -> MediaResult<Self> {
        let session = Mutex::new(create_session(Path::new(&config.model_path), "board")?);
        info!(
            model_path = %config.model_path,
            class_id = ?config.class_id,
            "Board detector initialized"
        );
        Ok(Self { session, config })
    }

    /// Box of the most confident board, in source pixels.
    pub fn detect_image(&self, img: &DynamicImage) -> MediaResult<Option<BoardBox>> {
        let (width, height) = img.dimensions();
        let input = preprocess(img, self.config.input_size)?;
        let output = run_inference(&self.session, input)?;
        decode_board(
            &output,
            self.config.confidence_threshold,
            self.config.class_id,
            InputScale::new(self.config.input_size, width, height),
        )
    }

    pub fn config(&self) -> &BoardDetectorConfig {
        &self.config
    }
}

/// Pick the best board box and map it back to source pixels.
///
/// Rows are `cx, cy, w, h` followed by one score per class.
pub fn decode_board(
    output: &YoloOutput,
    threshold: f32,
    class_id: Option<usize>,
    scale: InputScale,
) -> MediaResult<Option<BoardBox>> {
    let num_classes = output.rows().saturating_sub(4);
    if num_classes == 0 {
        return Err(MediaError::detection_failed(format!(
            "Board output has {} rows, expected box plus class scores",
            output.rows()
        )));
    }
    if let Some(id) = class_id {
        if id >= num_classes {
            return Err(MediaError::detection_failed(format!(
                "Board class {} out of range for a {}-class model",
                id, num_classes
            )));
        }
    }

    let candidates = output.candidates()?;
    let best = best_candidate(&candidates, threshold, |row| match class_id {
        Some(id) => row[4 + id],
        None => (0..num_classes)
            .map(|c| row[4 + c])
            .fold(f32::NEG_INFINITY, f32::max),
    });

    Ok(best.map(|(i, _)| {
        let row = candidates.row(i);
        scale.corners(row[0], row[1], row[2], row[3])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(rows: usize, candidates: &[Vec<f32>]) -> YoloOutput {
        let n = candidates.len();
        let mut data = vec![0.0f32; rows * n];
        for (i, cand) in candidates.iter().enumerate() {
            for (r, v) in cand.iter().enumerate() {
                data[r * n + i] = *v;
            }
        }
        YoloOutput::from_raw(&[1, rows, n], data).unwrap()
    }

    #[test]
    fn test_single_class_model() {
        let output = tensor(
            5,
            &[
                vec![100.0, 100.0, 40.0, 20.0, 0.3],
                vec![300.0, 200.0, 80.0, 20.0, 0.7],
            ],
        );
        let board = decode_board(&output, 0.25, None, InputScale::new(640, 640, 640))
            .unwrap()
            .unwrap();
        assert!((board.x1 - 260.0).abs() < 1e-6);
        assert!((board.x2 - 340.0).abs() < 1e-6);
        assert!((board.y1 - 190.0).abs() < 1e-6);
        assert!((board.y2 - 210.0).abs() < 1e-6);
    }

    #[test]
    fn test_class_filter() {
        // 3 classes; class 2 is the board
        let output = tensor(
            7,
            &[
                vec![100.0, 100.0, 40.0, 20.0, 0.9, 0.0, 0.1],
                vec![300.0, 200.0, 80.0, 20.0, 0.0, 0.0, 0.6],
            ],
        );
        let scale = InputScale::new(640, 640, 640);
        let board = decode_board(&output, 0.25, Some(2), scale).unwrap().unwrap();
        assert!((board.center().x - 300.0).abs() < 1e-6);

        let any = decode_board(&output, 0.25, None, scale).unwrap().unwrap();
        assert!((any.center().x - 100.0).abs() < 1e-6);

        assert!(decode_board(&output, 0.25, Some(5), scale).is_err());
    }

    #[test]
    fn test_no_board() {
        let output = tensor(5, &[vec![100.0, 100.0, 40.0, 20.0, 0.05]]);
        assert!(decode_board(&output, 0.25, None, InputScale::new(640, 640, 640))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_coco_class() {
        assert_eq!(COCO_SKATEBOARD_CLASS, 36);
    }
}
