//! Leaderboard persistence for scored trick submissions.
//!
//! A single SQLite table keyed by (user, trick). Scores are stored as
//! floats in [0, 10].

pub mod error;
pub mod store;

pub use error::{LeaderboardError, LeaderboardResult};
pub use store::{LeaderboardConfig, LeaderboardStore};
