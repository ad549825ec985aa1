//! HTTP service for scoring skateboard tricks.
//!
//! Skaters upload a clip of a run, the service scores it against the trick's
//! reference profile and keeps each skater's best score per trick on a
//! SQLite leaderboard. Routes:
//!
//! | Route | Handler |
//! |-------|---------|
//! | `POST /submit_run` | [`handlers::submit_run`] |
//! | `GET /leaderboard` | [`handlers::get_leaderboard`] |
//! | `GET /user/:username` | [`handlers::get_user_scores`] |
//! | `GET /tricks` | [`handlers::list_tricks`] |
//! | `GET /health`, `/healthz`, `/ready` | probes |
//! | `GET /metrics` | Prometheus, when enabled |

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, ScoringBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{RunScore, ScoringService};
pub use state::AppState;
