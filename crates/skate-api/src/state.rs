//! Application state.

use std::sync::Arc;

use skate_leaderboard::LeaderboardStore;
use skate_media::DetectorConfig;
use skate_scoring::{ReferenceProfileStore, ScoringConfig};
use tracing::info;

use crate::config::{ApiConfig, ScoringBackend};
use crate::services::ScoringService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub leaderboard: LeaderboardStore,
    pub scoring: Arc<ScoringService>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let profiles = match &config.reference_profiles_path {
            Some(path) => ReferenceProfileStore::load_or_builtin(path)?,
            None => ReferenceProfileStore::builtin(),
        };
        let profiles = Arc::new(profiles);

        let scoring = match config.scoring_backend {
            ScoringBackend::Onnx => ScoringService::onnx(
                profiles,
                &ScoringConfig::from_env(),
                DetectorConfig::from_env(),
                config.scoring_timeout,
            )?,
            ScoringBackend::Stub => {
                info!(score = config.stub_score, "Using stub scoring engine");
                ScoringService::stub(profiles, config.stub_score, config.scoring_timeout)
            }
        };

        let leaderboard = LeaderboardStore::connect(&config.database_url).await?;

        Ok(Self::from_parts(config, leaderboard, scoring))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(config: ApiConfig, leaderboard: LeaderboardStore, scoring: ScoringService) -> Self {
        Self {
            config,
            leaderboard,
            scoring: Arc::new(scoring),
        }
    }
}
