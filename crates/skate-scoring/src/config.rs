//! Scoring configuration.

use crate::airtime::{DEFAULT_AIRBORNE_THRESHOLD, DEFAULT_MAX_GAP_FRAMES};
use crate::error::ScoringResult;
use crate::scorer::{ScoreWeights, SimilarityScorer, DEFAULT_EPSILON};

/// Nominal frame rate used when a source cannot report one.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Feature extraction and scoring parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Foot-to-board distance above which the skater is airborne (pixels)
    pub airborne_threshold: f64,
    /// Undetected frames bridged inside a jump
    pub max_gap_frames: u32,
    /// Per-feature score weights
    pub weights: ScoreWeights,
    /// Tolerance guard for expected values near zero
    pub epsilon: f64,
    /// Frame rate used when the source reports none
    pub fallback_frame_rate: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            airborne_threshold: DEFAULT_AIRBORNE_THRESHOLD,
            max_gap_frames: DEFAULT_MAX_GAP_FRAMES,
            weights: ScoreWeights::default(),
            epsilon: DEFAULT_EPSILON,
            fallback_frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl ScoringConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            airborne_threshold: env_or("SKATE_AIRBORNE_THRESHOLD", defaults.airborne_threshold),
            max_gap_frames: env_or("SKATE_MAX_GAP_FRAMES", defaults.max_gap_frames),
            weights: ScoreWeights {
                mean_distance: env_or("SKATE_WEIGHT_MEAN_DISTANCE", defaults.weights.mean_distance),
                std_distance: env_or("SKATE_WEIGHT_STD_DISTANCE", defaults.weights.std_distance),
                std_board_angle: env_or(
                    "SKATE_WEIGHT_STD_BOARD_ANGLE",
                    defaults.weights.std_board_angle,
                ),
                std_torso_angle: env_or(
                    "SKATE_WEIGHT_STD_TORSO_ANGLE",
                    defaults.weights.std_torso_angle,
                ),
                airtime: env_or("SKATE_WEIGHT_AIRTIME", defaults.weights.airtime),
            },
            epsilon: env_or("SKATE_TOLERANCE_EPSILON", defaults.epsilon),
            fallback_frame_rate: env_or("SKATE_FALLBACK_FRAME_RATE", defaults.fallback_frame_rate),
        }
    }

    /// Build the scorer, validating weights.
    pub fn scorer(&self) -> ScoringResult<SimilarityScorer> {
        SimilarityScorer::new(self.weights, self.epsilon)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
