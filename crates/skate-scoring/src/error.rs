//! Error types for trick scoring.

use skate_models::FeatureName;
use thiserror::Error;

/// Result type for scoring operations.
pub type ScoringResult<T> = Result<T, ScoringError>;

/// Errors that can occur while extracting features or scoring a video.
///
/// Only `NoDetections` and `UnknownTrick` describe whole-video outcomes;
/// the per-frame variants are recovered inside the pipeline.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Keypoint set has {found} landmarks, schema requires {required}")]
    InsufficientLandmarks { required: usize, found: usize },

    #[error("No frame contained both a skater and a board")]
    NoDetections,

    #[error("Unknown trick '{name}'. Must be one of: {known:?}")]
    UnknownTrick { name: String, known: Vec<String> },

    #[error("Invalid reference profile for '{trick}': {feature} must be finite and non-negative")]
    InvalidProfile { trick: String, feature: FeatureName },

    #[error("Invalid score weights: {0}")]
    InvalidWeights(String),

    #[error("Detector failed: {0}")]
    Detector(String),

    #[error("Frame source failed: {0}")]
    Source(String),

    #[error("No training videos produced features for '{0}'")]
    EmptyCorpus(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl ScoringError {
    /// Create a detector failure error.
    pub fn detector(message: impl Into<String>) -> Self {
        Self::Detector(message.into())
    }

    /// Create a frame source failure error.
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Whether this error only invalidates a single frame.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            ScoringError::InsufficientLandmarks { .. } | ScoringError::Detector(_)
        )
    }
}
