//! Shared data models for the skate trick scoring backend.
//!
//! This crate provides Serde-serializable types for:
//! - The COCO body-landmark schema and per-frame keypoint sets
//! - Skateboard bounding boxes and decoded RGB frames
//! - Per-frame signals and per-video feature summaries
//! - Reference profiles and score breakdowns
//! - Leaderboard records

pub mod board;
pub mod features;
pub mod frame;
pub mod landmark;
pub mod leaderboard;
pub mod profile;
pub mod score;

// Re-export common types
pub use board::BoardBox;
pub use features::{FeatureName, FrameSignal, VideoFeatureSummary, VideoStats};
pub use frame::RgbFrame;
pub use landmark::{KeypointSet, Landmark, Point2};
pub use leaderboard::{LeaderboardEntry, SubmissionOutcome};
pub use profile::{normalize_trick_name, ReferenceProfile, ReferenceReport};
pub use score::{FeatureContribution, ScoreBreakdown, MAX_SCORE};
