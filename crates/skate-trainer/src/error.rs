//! Trainer error types.

use thiserror::Error;

pub type TrainerResult<T> = Result<T, TrainerError>;

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Scoring error: {0}")]
    Scoring(#[from] skate_scoring::ScoringError),

    #[error("Media error: {0}")]
    Media(#[from] skate_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrainerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
