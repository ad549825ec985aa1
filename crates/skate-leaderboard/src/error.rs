//! Leaderboard error types.

use thiserror::Error;

/// Result type for leaderboard operations.
pub type LeaderboardResult<T> = Result<T, LeaderboardError>;

/// Errors from the leaderboard store.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),
}

impl LeaderboardError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidSubmission(message.into())
    }
}
