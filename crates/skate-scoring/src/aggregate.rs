//! Video feature aggregation.

use skate_models::{FrameSignal, VideoFeatureSummary};

use crate::error::{ScoringError, ScoringResult};

/// Collects frame signals for one video and reduces them to a summary.
#[derive(Debug, Clone, Default)]
pub struct FeatureAccumulator {
    distances: Vec<f64>,
    board_angles: Vec<f64>,
    torso_angles: Vec<f64>,
}

impl FeatureAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one frame's signal.
    pub fn push(&mut self, signal: FrameSignal) {
        self.distances.push(signal.distance);
        self.board_angles.push(signal.board_angle);
        self.torso_angles.push(signal.torso_angle);
    }

    /// Number of signals collected.
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Reduce to a summary. Fails with `NoDetections` when empty.
    pub fn summarize(&self, airtime_seconds: f64) -> ScoringResult<VideoFeatureSummary> {
        if self.is_empty() {
            return Err(ScoringError::NoDetections);
        }

        Ok(VideoFeatureSummary {
            mean_distance: mean(&self.distances),
            std_distance: population_std(&self.distances),
            std_board_angle: population_std(&self.board_angles),
            std_torso_angle: population_std(&self.torso_angles),
            airtime_seconds,
        })
    }
}

/// Summarize an already-filtered sequence of frame signals.
pub fn aggregate(signals: &[FrameSignal], airtime_seconds: f64) -> ScoringResult<VideoFeatureSummary> {
    let mut acc = FeatureAccumulator::new();
    for signal in signals {
        acc.push(*signal);
    }
    acc.summarize(airtime_seconds)
}

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n). Returns 0.0 for an empty
/// slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_no_detections() {
        let err = aggregate(&[], 0.0).unwrap_err();
        assert!(matches!(err, ScoringError::NoDetections));
    }

    #[test]
    fn test_statistics() {
        let signals = [
            FrameSignal::new(40.0, 10.0, -90.0),
            FrameSignal::new(70.0, 20.0, -80.0),
            FrameSignal::new(70.0, 30.0, -100.0),
        ];
        let summary = aggregate(&signals, 2.0 / 30.0).unwrap();
        assert!((summary.mean_distance - 60.0).abs() < 1e-9);
        // population std of [40, 70, 70] = sqrt(200)
        assert!((summary.std_distance - 200f64.sqrt()).abs() < 1e-9);
        // population std of [10, 20, 30] = sqrt(200/3)
        assert!((summary.std_board_angle - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert!((summary.std_torso_angle - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert!((summary.airtime_seconds - 2.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_frame_has_zero_spread() {
        let summary = aggregate(&[FrameSignal::new(12.0, 5.0, -90.0)], 0.0).unwrap();
        assert_eq!(summary.mean_distance, 12.0);
        assert_eq!(summary.std_distance, 0.0);
        assert_eq!(summary.std_board_angle, 0.0);
        assert_eq!(summary.std_torso_angle, 0.0);
    }

    #[test]
    fn test_helpers_on_empty_input() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std(&[]), 0.0);
    }
}
