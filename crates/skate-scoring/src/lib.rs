//! Skate trick feature extraction and scoring.
//!
//! This crate provides:
//! - Per-frame feature extraction (foot-board distance, board and torso angles)
//! - The airtime state machine
//! - Per-video aggregation through a shared [`FeaturePipeline`]
//! - The reference profile store and offline [`ReferenceBuilder`]
//! - Weighted similarity scoring
//!
//! Detection and decoding are consumed through the [`DetectorAdapter`] and
//! [`FrameSource`] traits.

pub mod aggregate;
pub mod airtime;
pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod profile;
pub mod reference;
pub mod scorer;

pub use aggregate::{aggregate, FeatureAccumulator};
pub use airtime::{AirtimeCount, AirtimeTracker};
pub use config::ScoringConfig;
pub use error::{ScoringError, ScoringResult};
pub use features::{board_angle, extract_frame_signal, foot_board_distance, torso_angle};
pub use pipeline::{
    DetectorAdapter, FeaturePipeline, FrameDetections, FrameSource, TrickScore, TrickScorer,
    VideoAnalysis,
};
pub use profile::ReferenceProfileStore;
pub use reference::ReferenceBuilder;
pub use scorer::{ScoreWeights, SimilarityScorer};
