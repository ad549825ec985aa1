//! Trainer configuration.

use std::path::PathBuf;

use skate_models::normalize_trick_name;

use crate::error::{TrainerError, TrainerResult};

/// Default location of the reference profile file.
pub const DEFAULT_PROFILES_PATH: &str = "reference_profiles.json";

/// Trainer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Trick the training videos demonstrate (normalized)
    pub trick: String,
    /// Directory holding the training videos
    pub video_dir: PathBuf,
    /// Where the reference report is written
    pub report_path: PathBuf,
    /// Reference profile file to merge the new profile into
    pub profiles_path: PathBuf,
    /// Accepted video extensions, lowercase, without dot
    pub video_extensions: Vec<String>,
}

impl TrainerConfig {
    /// Config for `trick` with default paths.
    pub fn new(trick: &str, video_dir: impl Into<PathBuf>) -> Self {
        let trick = normalize_trick_name(trick);
        Self {
            report_path: PathBuf::from(format!("{}_features.json", trick)),
            trick,
            video_dir: video_dir.into(),
            profiles_path: PathBuf::from(DEFAULT_PROFILES_PATH),
            video_extensions: vec!["mp4".to_string(), "mov".to_string(), "avi".to_string()],
        }
    }

    /// Create config from environment variables.
    ///
    /// `TRAINER_TRICK` and `TRAINER_VIDEO_DIR` are required.
    pub fn from_env() -> TrainerResult<Self> {
        let trick = required("TRAINER_TRICK")?;
        let video_dir = required("TRAINER_VIDEO_DIR")?;
        let mut config = Self::new(&trick, video_dir);

        if let Ok(path) = std::env::var("TRAINER_REPORT_PATH") {
            config.report_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("REFERENCE_PROFILES_PATH") {
            config.profiles_path = PathBuf::from(path);
        }
        if let Ok(list) = std::env::var("TRAINER_VIDEO_EXTENSIONS") {
            config.video_extensions = list
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot produce a profile.
    pub fn validate(&self) -> TrainerResult<()> {
        if self.trick.is_empty() {
            return Err(TrainerError::config_error("trick name must not be empty"));
        }
        if self.video_extensions.is_empty() {
            return Err(TrainerError::config_error("no video extensions configured"));
        }
        Ok(())
    }
}

fn required(key: &str) -> TrainerResult<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| TrainerError::config_error(format!("{} must be set", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_trick() {
        let config = TrainerConfig::new(" Kickflip ", "videos/kickflip");
        assert_eq!(config.trick, "kickflip");
        assert_eq!(config.report_path, PathBuf::from("kickflip_features.json"));
        assert_eq!(config.profiles_path, PathBuf::from(DEFAULT_PROFILES_PATH));
        assert_eq!(config.video_extensions, vec!["mp4", "mov", "avi"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let config = TrainerConfig::new("   ", "videos");
        assert!(matches!(config.validate(), Err(TrainerError::ConfigError(_))));

        let mut config = TrainerConfig::new("ollie", "videos");
        config.video_extensions.clear();
        assert!(config.validate().is_err());
    }
}
