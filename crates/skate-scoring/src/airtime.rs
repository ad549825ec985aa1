//! Airtime tracking.
//!
//! A two-state machine (grounded / airborne) fed one observation per decoded
//! frame. Detected frames carry the foot-to-board distance; frames without a
//! usable detection are reported as gaps.
//!
//! Gap policy: while airborne, up to `max_gap_frames` consecutive gap frames
//! are held as pending. They are added to the run only when the next detected
//! frame is still airborne. A grounded frame, a gap longer than the
//! tolerance, or the end of the stream flushes the run without them. Gaps
//! while grounded are ignored. A clip that ends mid-air keeps its open run.

use tracing::trace;

/// Default airborne distance threshold (pixels).
pub const DEFAULT_AIRBORNE_THRESHOLD: f64 = 50.0;

/// Default number of undetected frames bridged inside a jump.
pub const DEFAULT_MAX_GAP_FRAMES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AirState {
    Grounded,
    Airborne { run: u32, pending_gap: u32 },
}

/// Accumulates airborne frames for one video.
///
/// One tracker per video; it is consumed by [`AirtimeTracker::finish`].
#[derive(Debug, Clone)]
pub struct AirtimeTracker {
    threshold: f64,
    max_gap_frames: u32,
    state: AirState,
    total_airborne_frames: u64,
    runs: u32,
}

impl Default for AirtimeTracker {
    fn default() -> Self {
        Self::new(DEFAULT_AIRBORNE_THRESHOLD)
    }
}

impl AirtimeTracker {
    /// Create a tracker with the default gap tolerance.
    pub fn new(threshold: f64) -> Self {
        Self::with_gap_tolerance(threshold, DEFAULT_MAX_GAP_FRAMES)
    }

    /// Create a tracker with an explicit gap tolerance (0 = strict).
    pub fn with_gap_tolerance(threshold: f64, max_gap_frames: u32) -> Self {
        Self {
            threshold,
            max_gap_frames,
            state: AirState::Grounded,
            total_airborne_frames: 0,
            runs: 0,
        }
    }

    /// Feed the distance of a detected frame.
    pub fn observe(&mut self, distance: f64) {
        let airborne = distance > self.threshold;
        self.state = match (self.state, airborne) {
            (AirState::Grounded, true) => AirState::Airborne {
                run: 1,
                pending_gap: 0,
            },
            (AirState::Grounded, false) => AirState::Grounded,
            (AirState::Airborne { run, pending_gap }, true) => AirState::Airborne {
                run: run + pending_gap + 1,
                pending_gap: 0,
            },
            (AirState::Airborne { run, .. }, false) => {
                self.flush(run);
                AirState::Grounded
            }
        };
    }

    /// Record a frame that produced no usable detection.
    pub fn observe_gap(&mut self) {
        if let AirState::Airborne { run, pending_gap } = self.state {
            let pending_gap = pending_gap + 1;
            if pending_gap > self.max_gap_frames {
                trace!(run, pending_gap, "Detection gap exceeded tolerance, closing run");
                self.flush(run);
                self.state = AirState::Grounded;
            } else {
                self.state = AirState::Airborne { run, pending_gap };
            }
        }
    }

    /// Whether the tracker is currently inside a jump.
    pub fn is_airborne(&self) -> bool {
        matches!(self.state, AirState::Airborne { .. })
    }

    /// Finish the video, flushing any open run.
    pub fn finish(mut self) -> AirtimeCount {
        if let AirState::Airborne { run, .. } = self.state {
            self.flush(run);
            self.state = AirState::Grounded;
        }
        AirtimeCount {
            frames: self.total_airborne_frames,
            runs: self.runs,
        }
    }

    fn flush(&mut self, run: u32) {
        self.total_airborne_frames += u64::from(run);
        self.runs += 1;
    }
}

/// Final airtime tally for one video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AirtimeCount {
    /// Total airborne frames
    pub frames: u64,
    /// Number of completed jumps
    pub runs: u32,
}

impl AirtimeCount {
    /// Convert to seconds at the given frame rate.
    pub fn seconds(&self, frame_rate: f64) -> f64 {
        if frame_rate > 0.0 {
            self.frames as f64 / frame_rate
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(distances: &[f64]) -> AirtimeCount {
        let mut tracker = AirtimeTracker::new(50.0);
        for d in distances {
            tracker.observe(*d);
        }
        tracker.finish()
    }

    #[test]
    fn test_single_jump() {
        let count = run(&[10.0, 10.0, 60.0, 60.0, 60.0, 10.0, 10.0]);
        assert_eq!(count.frames, 3);
        assert_eq!(count.runs, 1);
        assert!((count.seconds(30.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_clip_ending_mid_air_keeps_run() {
        let count = run(&[10.0, 60.0, 60.0, 60.0]);
        assert_eq!(count.frames, 3);
        assert!((count.seconds(30.0) - 3.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(run(&[50.0, 50.0, 50.0]).frames, 0);
        assert_eq!(run(&[50.0001]).frames, 1);
    }

    #[test]
    fn test_multiple_jumps_accumulate() {
        let count = run(&[60.0, 10.0, 70.0, 70.0, 10.0, 80.0]);
        assert_eq!(count.frames, 4);
        assert_eq!(count.runs, 3);
    }

    #[test]
    fn test_gap_inside_jump_is_bridged() {
        let mut tracker = AirtimeTracker::with_gap_tolerance(50.0, 2);
        tracker.observe(60.0);
        tracker.observe_gap();
        tracker.observe_gap();
        tracker.observe(60.0);
        tracker.observe(10.0);
        assert_eq!(tracker.finish().frames, 4);
    }

    #[test]
    fn test_gap_followed_by_landing_is_not_counted() {
        let mut tracker = AirtimeTracker::with_gap_tolerance(50.0, 5);
        tracker.observe(60.0);
        tracker.observe(60.0);
        tracker.observe_gap();
        tracker.observe(10.0);
        assert_eq!(tracker.finish().frames, 2);
    }

    #[test]
    fn test_trailing_gap_is_not_counted() {
        let mut tracker = AirtimeTracker::with_gap_tolerance(50.0, 5);
        tracker.observe(40.0);
        tracker.observe(70.0);
        tracker.observe(70.0);
        tracker.observe_gap();
        tracker.observe_gap();
        assert!(tracker.is_airborne());
        assert_eq!(tracker.finish().frames, 2);
    }

    #[test]
    fn test_gap_longer_than_tolerance_closes_run() {
        let mut tracker = AirtimeTracker::with_gap_tolerance(50.0, 1);
        tracker.observe(60.0);
        tracker.observe_gap();
        tracker.observe_gap();
        assert!(!tracker.is_airborne());
        tracker.observe(60.0);
        let count = tracker.finish();
        assert_eq!(count.frames, 2);
        assert_eq!(count.runs, 2);
    }

    #[test]
    fn test_strict_mode_gap_ends_run() {
        let mut tracker = AirtimeTracker::with_gap_tolerance(50.0, 0);
        tracker.observe(60.0);
        tracker.observe_gap();
        tracker.observe(60.0);
        let count = tracker.finish();
        assert_eq!(count.frames, 2);
        assert_eq!(count.runs, 2);
    }

    #[test]
    fn test_gaps_while_grounded_are_ignored() {
        let mut tracker = AirtimeTracker::new(50.0);
        tracker.observe_gap();
        tracker.observe(10.0);
        tracker.observe_gap();
        assert_eq!(tracker.finish(), AirtimeCount::default());
    }

    #[test]
    fn test_zero_frame_rate() {
        let count = AirtimeCount { frames: 3, runs: 1 };
        assert_eq!(count.seconds(0.0), 0.0);
    }
}
