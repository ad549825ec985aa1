//! Similarity score breakdown.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::features::FeatureName;

/// Upper bound of a similarity score.
pub const MAX_SCORE: f64 = 10.0;

/// How one feature contributed to the final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureContribution {
    pub feature: FeatureName,
    pub actual: f64,
    pub expected: f64,
    pub weight: f64,
    /// Closeness in [0, 1]
    pub closeness: f64,
    /// closeness * weight * MAX_SCORE
    pub contribution: f64,
}

/// A score in [0, 10] with its per-feature terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreBreakdown {
    pub score: f64,
    pub contributions: Vec<FeatureContribution>,
}

impl ScoreBreakdown {
    /// Contribution entry for a feature, if it was weighted.
    pub fn contribution(&self, feature: FeatureName) -> Option<&FeatureContribution> {
        self.contributions.iter().find(|c| c.feature == feature)
    }
}
