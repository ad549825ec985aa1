//! Reference profile store.
//!
//! Holds the expected feature values per trick. The table is read-only while
//! scoring; only the offline reference job writes it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use skate_models::{normalize_trick_name, ReferenceProfile};

use crate::error::{ScoringError, ScoringResult};

/// Trick names shipped with the built-in table.
pub const BUILTIN_TRICKS: &[&str] = &["kickflip", "ollie"];

/// Mapping from trick name to reference profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceProfileStore {
    profiles: BTreeMap<String, ReferenceProfile>,
}

impl Default for ReferenceProfileStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReferenceProfileStore {
    /// Empty store.
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// Profiles aggregated from the labeled training corpus.
    pub fn builtin() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "ollie".to_string(),
            ReferenceProfile {
                mean_distance: 79.0276641845703,
                std_distance: 16.40071868896484,
                std_board_angle: 10.663710594177246,
                std_torso_angle: 10.90312957763672,
                airtime: 0.23395061728395064,
            },
        );
        profiles.insert(
            "kickflip".to_string(),
            ReferenceProfile {
                mean_distance: 82.902587890625,
                std_distance: 87.01153564453125,
                std_board_angle: 8.528315544128418,
                std_torso_angle: 51.08692169189453,
                airtime: 0.2009433962264151,
            },
        );
        Self { profiles }
    }

    /// Load a store from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> ScoringResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let store = Self::from_json(&bytes)?;
        info!(
            path = %path.display(),
            tricks = ?store.tricks(),
            "Loaded reference profiles"
        );
        Ok(store)
    }

    /// Load from a file if it exists, falling back to the built-in table.
    pub fn load_or_builtin(path: impl AsRef<Path>) -> ScoringResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "Reference profile file not found, using built-in table");
            Ok(Self::builtin())
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(bytes: &[u8]) -> ScoringResult<Self> {
        let raw: BTreeMap<String, ReferenceProfile> = serde_json::from_slice(bytes)?;
        let mut store = Self::empty();
        for (trick, profile) in raw {
            store.upsert(&trick, profile)?;
        }
        Ok(store)
    }

    /// Write the store as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> ScoringResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved reference profiles");
        Ok(())
    }

    /// Insert or replace a trick's profile.
    pub fn upsert(&mut self, trick: &str, profile: ReferenceProfile) -> ScoringResult<()> {
        let trick = normalize_trick_name(trick);
        if let Some(feature) = profile.invalid_feature() {
            return Err(ScoringError::InvalidProfile { trick, feature });
        }
        self.profiles.insert(trick, profile);
        Ok(())
    }

    /// Look up a trick's profile.
    pub fn lookup(&self, trick: &str) -> ScoringResult<&ReferenceProfile> {
        let key = normalize_trick_name(trick);
        self.profiles
            .get(&key)
            .ok_or_else(|| ScoringError::UnknownTrick {
                name: trick.to_string(),
                known: self.tricks(),
            })
    }

    /// Known trick names, sorted.
    pub fn tricks(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tricks() {
        let store = ReferenceProfileStore::builtin();
        assert_eq!(store.tricks(), BUILTIN_TRICKS);
        let ollie = store.lookup("ollie").unwrap();
        assert!((ollie.mean_distance - 79.0276641845703).abs() < 1e-9);
    }

    #[test]
    fn test_lookup_normalizes_name() {
        let store = ReferenceProfileStore::builtin();
        assert!(store.lookup("  KickFlip ").is_ok());
        assert_eq!(store.lookup("OLLIE").unwrap(), store.lookup("ollie").unwrap());
    }

    #[test]
    fn test_unknown_trick() {
        let store = ReferenceProfileStore::builtin();
        match store.lookup("heelflip") {
            Err(ScoringError::UnknownTrick { name, known }) => {
                assert_eq!(name, "heelflip");
                assert_eq!(known, vec!["kickflip".to_string(), "ollie".to_string()]);
            }
            other => panic!("expected UnknownTrick, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_negative_profile() {
        let mut store = ReferenceProfileStore::empty();
        let bad = ReferenceProfile::from_fn(|_| -1.0);
        assert!(matches!(
            store.upsert("ollie", bad),
            Err(ScoringError::InvalidProfile { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles").join("reference.json");

        let mut store = ReferenceProfileStore::builtin();
        store
            .upsert("Heelflip", ReferenceProfile::from_fn(|_| 2.5))
            .unwrap();
        store.save(&path).unwrap();

        let loaded = ReferenceProfileStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.lookup("heelflip").unwrap().airtime, 2.5);
    }

    #[test]
    fn test_load_or_builtin_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReferenceProfileStore::load_or_builtin(dir.path().join("missing.json")).unwrap();
        assert_eq!(store, ReferenceProfileStore::builtin());
    }

    #[test]
    fn test_from_json_accepts_legacy_keys() {
        let json = br#"{"Ollie": {"mean_dist": 1.0, "std_dist": 2.0, "std_board_angle": 3.0,
                                   "std_torso_angle": 4.0, "airtime": 0.1}}"#;
        let store = ReferenceProfileStore::from_json(json).unwrap();
        assert_eq!(store.tricks(), vec!["ollie".to_string()]);
        assert_eq!(store.lookup("ollie").unwrap().std_distance, 2.0);
    }
}
