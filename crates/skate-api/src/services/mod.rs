//! Business logic services.

pub mod scoring;

pub use scoring::{RunScore, ScoringService};
