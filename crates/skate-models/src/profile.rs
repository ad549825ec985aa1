//! Reference profiles: the expected feature values for a trick.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::features::FeatureName;

/// Expected feature values for one trick.
///
/// Field names match the persisted profile file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceProfile {
    #[serde(alias = "mean_dist")]
    pub mean_distance: f64,
    #[serde(alias = "std_dist")]
    pub std_distance: f64,
    pub std_board_angle: f64,
    pub std_torso_angle: f64,
    #[serde(alias = "airtime_seconds")]
    pub airtime: f64,
}

impl ReferenceProfile {
    /// Value of a single feature.
    pub fn feature(&self, name: FeatureName) -> f64 {
        match name {
            FeatureName::MeanDistance => self.mean_distance,
            FeatureName::StdDistance => self.std_distance,
            FeatureName::StdBoardAngle => self.std_board_angle,
            FeatureName::StdTorsoAngle => self.std_torso_angle,
            FeatureName::Airtime => self.airtime,
        }
    }

    /// Build a profile from per-feature values.
    pub fn from_fn(mut f: impl FnMut(FeatureName) -> f64) -> Self {
        Self {
            mean_distance: f(FeatureName::MeanDistance),
            std_distance: f(FeatureName::StdDistance),
            std_board_angle: f(FeatureName::StdBoardAngle),
            std_torso_angle: f(FeatureName::StdTorsoAngle),
            airtime: f(FeatureName::Airtime),
        }
    }

    /// First feature that is negative or not finite, if any.
    pub fn invalid_feature(&self) -> Option<FeatureName> {
        FeatureName::ALL.into_iter().find(|name| {
            let value = self.feature(*name);
            !value.is_finite() || value < 0.0
        })
    }
}

/// Output of the offline reference-building job for one trick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceReport {
    /// Normalized trick name
    pub trick: String,
    /// Number of videos that contributed a summary
    pub videos: usize,
    /// Videos skipped because no frame had both detections
    pub skipped: usize,
    /// Per-feature mean across videos (the new reference profile)
    pub mean: ReferenceProfile,
    /// Per-feature population standard deviation across videos
    pub std: ReferenceProfile,
}

/// Canonical form of a trick name: trimmed and lowercased.
pub fn normalize_trick_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_json_field_names() {
        let profile = ReferenceProfile {
            mean_distance: 1.0,
            std_distance: 2.0,
            std_board_angle: 3.0,
            std_torso_angle: 4.0,
            airtime: 0.5,
        };
        let json = serde_json::to_value(profile).unwrap();
        assert_eq!(json["mean_distance"], 1.0);
        assert_eq!(json["airtime"], 0.5);
    }

    #[test]
    fn test_profile_accepts_short_aliases() {
        let json = r#"{"mean_dist": 79.0, "std_dist": 16.4, "std_board_angle": 10.6,
                       "std_torso_angle": 10.9, "airtime": 0.23}"#;
        let profile: ReferenceProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.mean_distance, 79.0);
        assert_eq!(profile.std_distance, 16.4);
    }

    #[test]
    fn test_invalid_feature() {
        let mut profile = ReferenceProfile::from_fn(|_| 1.0);
        assert_eq!(profile.invalid_feature(), None);
        profile.std_board_angle = -1.0;
        assert_eq!(profile.invalid_feature(), Some(FeatureName::StdBoardAngle));
        profile.std_board_angle = f64::NAN;
        assert_eq!(profile.invalid_feature(), Some(FeatureName::StdBoardAngle));
    }

    #[test]
    fn test_normalize_trick_name() {
        assert_eq!(normalize_trick_name("  KickFlip "), "kickflip");
    }
}
