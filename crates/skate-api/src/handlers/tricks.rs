//! Trick catalogue.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct TricksResponse {
    pub tricks: Vec<String>,
}

/// List tricks that have a reference profile.
pub async fn list_tricks(State(state): State<AppState>) -> Json<TricksResponse> {
    Json(TricksResponse {
        tricks: state.scoring.tricks(),
    })
}
