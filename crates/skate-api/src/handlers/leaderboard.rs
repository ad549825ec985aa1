//! Leaderboard handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use skate_models::LeaderboardEntry;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Upper bound for `?limit=`.
pub const MAX_LEADERBOARD_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Serialize)]
pub struct UserScoresResponse {
    pub user: String,
    pub scores: Vec<LeaderboardEntry>,
}

/// Top scores, best first.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<LeaderboardResponse>> {
    let limit = query
        .limit
        .unwrap_or(state.config.leaderboard_limit)
        .clamp(1, MAX_LEADERBOARD_LIMIT);

    let leaderboard = state.leaderboard.top_scores(limit).await?;
    Ok(Json(LeaderboardResponse { leaderboard }))
}

/// All of one skater's stored scores.
pub async fn get_user_scores(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserScoresResponse>> {
    let user = username.trim().to_string();
    let scores = state.leaderboard.user_scores(&user).await?;
    if scores.is_empty() {
        return Err(ApiError::not_found(format!("No scores for user '{}'", user)));
    }
    Ok(Json(UserScoresResponse { user, scores }))
}
