//! Video decoding and detection for skate trick scoring.
//!
//! This crate provides:
//! - FFprobe stream inspection
//! - An FFmpeg rawvideo [`FfmpegFrameSource`] implementing `FrameSource`
//! - YOLOv8 pose and board detectors on ONNX Runtime, combined in
//!   [`OnnxDetectorAdapter`]

pub mod detection;
pub mod error;
pub mod frames;
pub mod probe;

pub use detection::{DetectorConfig, OnnxDetectorAdapter};
pub use error::{MediaError, MediaResult};
pub use frames::FfmpegFrameSource;
pub use probe::{parse_frame_rate, probe_video, VideoInfo};

use std::path::PathBuf;

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
