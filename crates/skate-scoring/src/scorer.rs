//! Similarity scoring against a reference profile.
//!
//! For each weighted feature:
//!
//! ```text
//! diff         = |actual - expected|
//! tolerance    = expected + epsilon
//! closeness    = max(0, 1 / (1 + diff / tolerance))
//! contribution = closeness * weight * 10
//! ```
//!
//! The score is the sum of contributions. Weights sum to 1, so a perfect match
//! scores exactly 10 and any mismatch lands in (0, 10).

use serde::{Deserialize, Serialize};

use skate_models::{
    FeatureContribution, FeatureName, ReferenceProfile, ScoreBreakdown, VideoFeatureSummary,
    MAX_SCORE,
};

use crate::error::{ScoringError, ScoringResult};

/// Default tolerance guard for expected values near zero.
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Allowed drift of the weight sum from 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-feature weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub mean_distance: f64,
    pub std_distance: f64,
    pub std_board_angle: f64,
    pub std_torso_angle: f64,
    /// Tracked but unweighted by default.
    pub airtime: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            mean_distance: 0.15,
            std_distance: 0.15,
            std_board_angle: 0.35,
            std_torso_angle: 0.35,
            airtime: 0.0,
        }
    }
}

impl ScoreWeights {
    /// Weight of a single feature.
    pub fn weight(&self, feature: FeatureName) -> f64 {
        match feature {
            FeatureName::MeanDistance => self.mean_distance,
            FeatureName::StdDistance => self.std_distance,
            FeatureName::StdBoardAngle => self.std_board_angle,
            FeatureName::StdTorsoAngle => self.std_torso_angle,
            FeatureName::Airtime => self.airtime,
        }
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        FeatureName::ALL.iter().map(|f| self.weight(*f)).sum()
    }

    /// Check weights are finite, non-negative and sum to 1.
    pub fn validate(&self) -> ScoringResult<()> {
        for feature in FeatureName::ALL {
            let w = self.weight(feature);
            if !w.is_finite() || w < 0.0 {
                return Err(ScoringError::InvalidWeights(format!(
                    "weight for {} must be finite and non-negative, got {}",
                    feature, w
                )));
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::InvalidWeights(format!(
                "weights must sum to 1.0, got {}",
                total
            )));
        }
        Ok(())
    }
}

/// Weighted closeness scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScorer {
    weights: ScoreWeights,
    epsilon: f64,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl SimilarityScorer {
    /// Create a scorer, validating the weights.
    pub fn new(weights: ScoreWeights, epsilon: f64) -> ScoringResult<Self> {
        weights.validate()?;
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(ScoringError::InvalidWeights(format!(
                "epsilon must be positive, got {}",
                epsilon
            )));
        }
        Ok(Self { weights, epsilon })
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Closeness of one feature value to its expectation, in [0, 1].
    pub fn closeness(&self, actual: f64, expected: f64) -> f64 {
        let diff = (actual - expected).abs();
        let tolerance = expected + self.epsilon;
        let closeness = 1.0 / (1.0 + diff / tolerance);
        if closeness.is_finite() {
            closeness.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Score a summary against a trick's reference profile.
    pub fn score(&self, actual: &VideoFeatureSummary, expected: &ReferenceProfile) -> ScoreBreakdown {
        let contributions: Vec<FeatureContribution> = FeatureName::ALL
            .iter()
            .filter(|f| self.weights.weight(**f) > 0.0)
            .map(|&feature| {
                let weight = self.weights.weight(feature);
                let actual = actual.feature(feature);
                let expected = expected.feature(feature);
                let closeness = self.closeness(actual, expected);
                FeatureContribution {
                    feature,
                    actual,
                    expected,
                    weight,
                    closeness,
                    contribution: closeness * weight * MAX_SCORE,
                }
            })
            .collect();

        let score = contributions
            .iter()
            .map(|c| c.contribution)
            .sum::<f64>()
            .clamp(0.0, MAX_SCORE);

        ScoreBreakdown {
            score,
            contributions,
        }
    }
}
