//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use skate_leaderboard::LeaderboardError;
use skate_media::MediaError;
use skate_scoring::ScoringError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned when no frame could be scored.
pub const NO_DETECTIONS_DETAIL: &str = "No skater/board detected for scoring.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("{}", NO_DETECTIONS_DETAIL)]
    NoDetections,

    #[error("Scoring timed out after {0} seconds")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Leaderboard error: {0}")]
    Leaderboard(#[from] LeaderboardError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Leaderboard(LeaderboardError::InvalidSubmission(_)) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NoDetections => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) | ApiError::Leaderboard(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<ScoringError> for ApiError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::UnknownTrick { .. } => ApiError::BadRequest(err.to_string()),
            ScoringError::NoDetections => ApiError::NoDetections,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidVideo(_) | MediaError::FfprobeFailed { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = if self.is_internal()
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_error_mapping() {
        let unknown: ApiError = ScoringError::UnknownTrick {
            name: "heelflip".to_string(),
            known: vec!["ollie".to_string()],
        }
        .into();
        assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);

        let none: ApiError = ScoringError::NoDetections.into();
        assert_eq!(none.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(none.to_string(), NO_DETECTIONS_DETAIL);

        let other: ApiError = ScoringError::source("ffmpeg died").into();
        assert_eq!(other.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_leaderboard_error_mapping() {
        let err: ApiError = LeaderboardError::invalid("empty user").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Timeout(120).status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_media_error_mapping() {
        let bad: ApiError = MediaError::InvalidVideo("no video stream".to_string()).into();
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let missing: ApiError = MediaError::FfmpegNotFound.into();
        assert_eq!(missing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
