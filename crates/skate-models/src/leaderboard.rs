//! Leaderboard records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One skater's best score for one trick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LeaderboardEntry {
    /// Skate alias
    pub user: String,
    /// Original upload file name
    pub file_name: String,
    pub trick_name: String,
    pub score: f64,
    /// When the stored score was recorded
    pub timestamp: DateTime<Utc>,
}

/// Result of recording a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubmissionOutcome {
    /// The entry as stored after the submission
    pub entry: LeaderboardEntry,
    /// Whether the submitted score replaced (or created) the stored one
    pub personal_best: bool,
}
