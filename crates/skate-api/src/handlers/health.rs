//! Liveness and readiness probes.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// `GET /health`: the process is up.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Outcome of one readiness dependency.
#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn from_result(result: Result<(), String>, started: Instant) -> Self {
        match result {
            Ok(()) => Self {
                status: "ok",
                error: None,
                latency_ms: Some(started.elapsed().as_millis() as u64),
            },
            Err(error) => Self {
                status: "error",
                error: Some(error),
                latency_ms: None,
            },
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub scoring_backend: &'static str,
    pub checks: BTreeMap<&'static str, CheckStatus>,
}

/// `GET /ready`: the leaderboard answers and at least one trick is scorable.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let mut checks = BTreeMap::new();

    let started = Instant::now();
    let database = state.leaderboard.ping().await.map_err(|e| e.to_string());
    checks.insert("database", CheckStatus::from_result(database, started));

    let started = Instant::now();
    let profiles = if state.scoring.profiles().is_empty() {
        Err("no reference profiles loaded".to_string())
    } else {
        Ok(())
    };
    checks.insert("reference_profiles", CheckStatus::from_result(profiles, started));

    let all_ok = checks.values().all(CheckStatus::is_ok);
    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if all_ok { "ready" } else { "degraded" },
            scoring_backend: state.scoring.backend_name(),
            checks,
        }),
    )
}
