//! ONNX detectors for the skater and the board.
//!
//! | Detector | Model | Output |
//! |----------|-------|--------|
//! | [`PoseDetector`] | YOLOv8-pose | 17 COCO keypoints of the best person |
//! | [`BoardDetector`] | YOLOv8 (custom or COCO) | best skateboard box |
//!
//! [`OnnxDetectorAdapter`] combines both behind the scoring crate's
//! `DetectorAdapter` trait.

pub mod adapter;
pub mod board;
pub mod pose;
pub mod session;
pub mod yolo;

pub use adapter::{DetectorConfig, OnnxDetectorAdapter};
pub use board::{BoardDetector, BoardDetectorConfig, COCO_SKATEBOARD_CLASS};
pub use pose::{PoseDetector, PoseDetectorConfig};
pub use session::create_session;
