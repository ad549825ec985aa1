//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use skate_scoring::ScoringError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Failures while probing, decoding or running the ONNX detectors.
///
/// Converted into [`ScoringError`] at the pipeline seams: detector failures
/// invalidate one frame, everything else is a source failure.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg binary not found on PATH; install FFmpeg to decode runs")]
    FfmpegNotFound,

    #[error("ffprobe binary not found on PATH; install FFmpeg to probe runs")]
    FfprobeNotFound,

    #[error("ffmpeg decode failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("ffprobe failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Video not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Unreadable video: {0}")]
    InvalidVideo(String),

    #[error("Pose/board detection failed: {0}")]
    DetectionFailed(String),

    #[error("ONNX model not found: {0}")]
    ModelNotFound(String),

    #[error("Media I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed ffprobe JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Media internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Detector inference or tensor decoding failed.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// FFmpeg exited badly or its pipes broke.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<MediaError> for ScoringError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::DetectionFailed(_) | MediaError::Internal(_) => {
                ScoringError::detector(err.to_string())
            }
            other => ScoringError::source(other.to_string()),
        }
    }
}
