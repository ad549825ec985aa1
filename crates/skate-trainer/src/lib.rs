//! Offline reference training.
//!
//! Builds a trick's reference profile from a directory of labeled videos
//! using the same feature pipeline as the online scorer.

pub mod config;
pub mod error;
pub mod logging;
pub mod trainer;

pub use config::TrainerConfig;
pub use error::{TrainerError, TrainerResult};
pub use logging::RunLogger;
pub use trainer::{collect_videos, train, write_outputs, RunTally, VideoOutcome};
