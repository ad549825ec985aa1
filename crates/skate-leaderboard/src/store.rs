//! SQLite-backed leaderboard store.
//!
//! One row per (user, trick). A new submission only replaces the stored one
//! when it scores higher.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use skate_models::{normalize_trick_name, LeaderboardEntry, SubmissionOutcome, MAX_SCORE};

use crate::error::{LeaderboardError, LeaderboardResult};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS leaderboard (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user TEXT NOT NULL,
    file_name TEXT NOT NULL,
    trick_name TEXT NOT NULL,
    score REAL NOT NULL,
    timestamp TEXT NOT NULL,
    UNIQUE (user, trick_name)
)
"#;

/// Insert, or replace only when strictly higher. Returns the row when written.
const UPSERT_BEST_SQL: &str = r#"
INSERT INTO leaderboard (user, file_name, trick_name, score, timestamp)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT (user, trick_name) DO UPDATE
SET file_name = excluded.file_name,
    score = excluded.score,
    timestamp = excluded.timestamp
WHERE excluded.score > leaderboard.score
RETURNING user, file_name, trick_name, score, timestamp
"#;

const CREATE_INDEX_SQL: &str =
    "CREATE INDEX IF NOT EXISTS idx_leaderboard_score ON leaderboard (score DESC)";

/// How long a writer waits on another connection's lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings.
#[derive(Debug, Clone)]
pub struct LeaderboardConfig {
    /// SQLite URL, e.g. `sqlite://leaderboard.db` or `sqlite::memory:`
    pub database_url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://leaderboard.db".to_string(),
            max_connections: 5,
        }
    }
}

impl LeaderboardConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            database_url: url.into(),
            ..Default::default()
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}

#[derive(Debug, Clone, FromRow)]
struct LeaderboardRow {
    user: String,
    file_name: String,
    trick_name: String,
    score: f64,
    timestamp: DateTime<Utc>,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            user: row.user,
            file_name: row.file_name,
            trick_name: row.trick_name,
            score: row.score,
            timestamp: row.timestamp,
        }
    }
}

/// Leaderboard persistence.
#[derive(Debug, Clone)]
pub struct LeaderboardStore {
    pool: SqlitePool,
}

impl LeaderboardStore {
    /// Connect with default settings and create the schema.
    pub async fn connect(database_url: &str) -> LeaderboardResult<Self> {
        Self::with_config(LeaderboardConfig::from_url(database_url)).await
    }

    /// Connect, creating the database file if needed, and create the schema.
    pub async fn with_config(config: LeaderboardConfig) -> LeaderboardResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);

        // Every in-memory connection is its own database; pin to one.
        let pool = if config.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect_with(options.journal_mode(SqliteJournalMode::Wal))
                .await?
        };

        let store = Self { pool };
        store.init_schema().await?;
        info!(url = %config.database_url, "Leaderboard database ready");
        Ok(store)
    }

    /// Create the table and index if missing.
    pub async fn init_schema(&self) -> LeaderboardResult<()> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Readiness check.
    pub async fn ping(&self) -> LeaderboardResult<()> {
        let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        debug!(result = one, "Leaderboard ping");
        Ok(())
    }

    /// Record a scored run, keeping the user's best score per trick.
    pub async fn upload_submission(
        &self,
        user: &str,
        file_name: &str,
        trick_name: &str,
        score: f64,
    ) -> LeaderboardResult<SubmissionOutcome> {
        let user = user.trim();
        let trick_name = normalize_trick_name(trick_name);
        if user.is_empty() {
            return Err(LeaderboardError::invalid("user must not be empty"));
        }
        if trick_name.is_empty() {
            return Err(LeaderboardError::invalid("trick name must not be empty"));
        }
        if !score.is_finite() || !(0.0..=MAX_SCORE).contains(&score) {
            return Err(LeaderboardError::invalid(format!(
                "score must be within [0, {}], got {}",
                MAX_SCORE, score
            )));
        }

        // Single statement so concurrent writers never upgrade a read lock.
        let replaced: Option<LeaderboardRow> = sqlx::query_as(UPSERT_BEST_SQL)
            .bind(user)
            .bind(file_name)
            .bind(&trick_name)
            .bind(score)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        let outcome = match replaced {
            Some(row) => SubmissionOutcome {
                entry: row.into(),
                personal_best: true,
            },
            None => {
                let row: LeaderboardRow = sqlx::query_as(
                    r#"
                    SELECT user, file_name, trick_name, score, timestamp
                    FROM leaderboard
                    WHERE user = ? AND trick_name = ?
                    "#,
                )
                .bind(user)
                .bind(&trick_name)
                .fetch_one(&self.pool)
                .await?;
                SubmissionOutcome {
                    entry: row.into(),
                    personal_best: false,
                }
            }
        };

        info!(
            user = %user,
            trick = %trick_name,
            score,
            personal_best = outcome.personal_best,
            "Submission recorded"
        );
        Ok(outcome)
    }

    /// Highest scores first; ties go to the earlier submission.
    pub async fn top_scores(&self, limit: u32) -> LeaderboardResult<Vec<LeaderboardEntry>> {
        let rows: Vec<LeaderboardRow> = sqlx::query_as(
            r#"
            SELECT user, file_name, trick_name, score, timestamp
            FROM leaderboard
            ORDER BY score DESC, timestamp ASC, id ASC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// All of one user's entries, best first.
    pub async fn user_scores(&self, user: &str) -> LeaderboardResult<Vec<LeaderboardEntry>> {
        let rows: Vec<LeaderboardRow> = sqlx::query_as(
            r#"
            SELECT user, file_name, trick_name, score, timestamp
            FROM leaderboard
            WHERE user = ?
            ORDER BY score DESC, timestamp ASC, id ASC
            "#,
        )
        .bind(user.trim())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get the connection pool for advanced usage.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
