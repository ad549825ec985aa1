//! Per-video feature pipeline.
//!
//! Frames are pulled one at a time from a [`FrameSource`], run through a
//! [`DetectorAdapter`], and folded into the feature accumulator and airtime
//! tracker before the next frame is fetched. Each call owns its own
//! accumulator and tracker, so concurrent videos never share mutable state.
//!
//! Per-frame failures (missing detections, truncated keypoint sets, detector
//! errors) drop the frame. Only `NoDetections` and `UnknownTrick` reach the
//! caller, plus a source failure before the first frame.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use skate_models::{
    BoardBox, KeypointSet, RgbFrame, ScoreBreakdown, VideoFeatureSummary, VideoStats,
};

use crate::aggregate::FeatureAccumulator;
use crate::airtime::AirtimeTracker;
use crate::config::ScoringConfig;
use crate::error::{ScoringError, ScoringResult};
use crate::features::extract_frame_signal;
use crate::profile::ReferenceProfileStore;
use crate::scorer::SimilarityScorer;

/// Ordered frames from a decoded video.
pub trait FrameSource {
    /// Nominal frame rate, if the source knows it.
    fn frame_rate(&self) -> Option<f64>;

    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> ScoringResult<Option<RgbFrame>>;
}

/// Person and board detections for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameDetections {
    /// Keypoints of the most confident person, if any
    pub keypoints: Option<KeypointSet>,
    /// Box of the most confident board, if any
    pub board: Option<BoardBox>,
}

impl FrameDetections {
    pub fn new(keypoints: Option<KeypointSet>, board: Option<BoardBox>) -> Self {
        Self { keypoints, board }
    }

    /// No person and no board.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Stateless-per-frame detection contract.
///
/// Implementations own model lifecycle: load once, reuse for every frame of
/// every video. They must be shareable across threads.
pub trait DetectorAdapter: Send + Sync {
    fn detect(&self, frame: &RgbFrame) -> ScoringResult<FrameDetections>;
}

impl<T: DetectorAdapter + ?Sized> DetectorAdapter for Arc<T> {
    fn detect(&self, frame: &RgbFrame) -> ScoringResult<FrameDetections> {
        (**self).detect(frame)
    }
}

/// Features and frame accounting for one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoAnalysis {
    pub summary: VideoFeatureSummary,
    pub stats: VideoStats,
}

/// Shared extraction pipeline used by both the online scorer and the
/// reference-building job.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    airborne_threshold: f64,
    max_gap_frames: u32,
    fallback_frame_rate: f64,
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}

impl FeaturePipeline {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            airborne_threshold: config.airborne_threshold,
            max_gap_frames: config.max_gap_frames,
            fallback_frame_rate: config.fallback_frame_rate,
        }
    }

    /// Run the whole video through detection and reduce it to a summary.
    pub fn extract<S, D>(&self, source: &mut S, detector: &D) -> ScoringResult<VideoAnalysis>
    where
        S: FrameSource + ?Sized,
        D: DetectorAdapter + ?Sized,
    {
        let frame_rate = source
            .frame_rate()
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(self.fallback_frame_rate);

        let mut acc = FeatureAccumulator::new();
        let mut airtime =
            AirtimeTracker::with_gap_tolerance(self.airborne_threshold, self.max_gap_frames);
        let mut stats = VideoStats {
            frame_rate,
            ..Default::default()
        };

        loop {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) if stats.frames_total == 0 => return Err(e),
                Err(e) => {
                    warn!(
                        frames_read = stats.frames_total,
                        error = %e,
                        "Frame source failed mid-stream, scoring frames read so far"
                    );
                    break;
                }
            };
            stats.frames_total += 1;

            let detections = match detector.detect(&frame) {
                Ok(d) => d,
                Err(e) => {
                    debug!(frame = frame.index, error = %e, "Detector failed, skipping frame");
                    stats.frames_detector_failed += 1;
                    airtime.observe_gap();
                    continue;
                }
            };

            let (keypoints, board) = match (detections.keypoints, detections.board) {
                (Some(k), Some(b)) => (k, b),
                _ => {
                    stats.frames_without_detection += 1;
                    airtime.observe_gap();
                    continue;
                }
            };

            match extract_frame_signal(&keypoints, &board) {
                Ok(signal) => {
                    stats.frames_detected += 1;
                    airtime.observe(signal.distance);
                    acc.push(signal);
                }
                Err(e) => {
                    debug!(frame = frame.index, error = %e, "Dropping frame");
                    stats.frames_insufficient_landmarks += 1;
                    airtime.observe_gap();
                }
            }
        }

        let count = airtime.finish();
        stats.airborne_frames = count.frames;
        let summary = acc.summarize(count.seconds(frame_rate))?;

        debug!(
            frames_total = stats.frames_total,
            frames_detected = stats.frames_detected,
            airborne_frames = stats.airborne_frames,
            jumps = count.runs,
            "Video features extracted"
        );

        Ok(VideoAnalysis { summary, stats })
    }
}

/// Score of one video for one trick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrickScore {
    /// Normalized trick name
    pub trick: String,
    pub summary: VideoFeatureSummary,
    pub stats: VideoStats,
    pub breakdown: ScoreBreakdown,
}

impl TrickScore {
    /// The final score in [0, 10].
    pub fn score(&self) -> f64 {
        self.breakdown.score
    }
}

/// Online scorer: pipeline + reference profiles + similarity scorer.
///
/// Cheap to clone; the profile store is shared read-only.
#[derive(Debug, Clone)]
pub struct TrickScorer {
    pipeline: FeaturePipeline,
    scorer: SimilarityScorer,
    profiles: Arc<ReferenceProfileStore>,
}

impl TrickScorer {
    pub fn new(
        pipeline: FeaturePipeline,
        scorer: SimilarityScorer,
        profiles: Arc<ReferenceProfileStore>,
    ) -> Self {
        Self {
            pipeline,
            scorer,
            profiles,
        }
    }

    /// Build from config, validating the weights.
    pub fn from_config(
        config: &ScoringConfig,
        profiles: Arc<ReferenceProfileStore>,
    ) -> ScoringResult<Self> {
        Ok(Self::new(FeaturePipeline::new(config), config.scorer()?, profiles))
    }

    pub fn profiles(&self) -> &ReferenceProfileStore {
        &self.profiles
    }

    /// Fail fast on trick names absent from the reference store.
    pub fn ensure_known_trick(&self, trick: &str) -> ScoringResult<()> {
        self.profiles.lookup(trick).map(|_| ())
    }

    /// Extract features from a video and score them for `trick`.
    ///
    /// The trick is resolved before any frame is decoded.
    pub fn score_video<S, D>(&self, trick: &str, source: &mut S, detector: &D) -> ScoringResult<TrickScore>
    where
        S: FrameSource + ?Sized,
        D: DetectorAdapter + ?Sized,
    {
        let expected = *self.profiles.lookup(trick)?;
        let analysis = self.pipeline.extract(source, detector)?;
        let breakdown = self.scorer.score(&analysis.summary, &expected);

        let trick = skate_models::normalize_trick_name(trick);
        info!(
            trick = %trick,
            score = breakdown.score,
            frames_detected = analysis.stats.frames_detected,
            frames_total = analysis.stats.frames_total,
            "Trick scored"
        );

        Ok(TrickScore {
            trick,
            summary: analysis.summary,
            stats: analysis.stats,
            breakdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skate_models::{Landmark, Point2};
    use std::collections::VecDeque;

    enum Scripted {
        Distance(f64),
        Nothing,
        Truncated,
        Fail,
    }

    struct ScriptedDetector {
        script: Vec<Scripted>,
    }

    const BOARD: BoardBox = BoardBox {
        x1: 0.0,
        y1: 0.0,
        x2: 100.0,
        y2: 10.0,
    };

    /// Upright skater with both ankles `distance` pixels below the board center.
    fn skater_at(distance: f64) -> KeypointSet {
        let center = BOARD.center();
        let mut points = vec![Point2::new(center.x, center.y - 100.0); Landmark::COUNT];
        for lm in [Landmark::LeftHip, Landmark::RightHip] {
            points[lm.index()] = Point2::new(center.x, center.y - 50.0);
        }
        for lm in [Landmark::LeftAnkle, Landmark::RightAnkle] {
            points[lm.index()] = Point2::new(center.x, center.y + distance);
        }
        KeypointSet::new(points)
    }

    impl DetectorAdapter for ScriptedDetector {
        fn detect(&self, frame: &RgbFrame) -> ScoringResult<FrameDetections> {
            match &self.script[frame.index as usize] {
                Scripted::Distance(d) => Ok(FrameDetections::new(Some(skater_at(*d)), Some(BOARD))),
                Scripted::Nothing => Ok(FrameDetections::none()),
                Scripted::Truncated => Ok(FrameDetections::new(
                    Some(KeypointSet::new(vec![Point2::default(); 5])),
                    Some(BOARD),
                )),
                Scripted::Fail => Err(ScoringError::detector("inference failed")),
            }
        }
    }

    struct VecSource {
        frame_rate: Option<f64>,
        frames: VecDeque<RgbFrame>,
        fail_after: Option<u64>,
        served: u64,
    }

    impl VecSource {
        fn new(count: usize) -> Self {
            Self {
                frame_rate: Some(30.0),
                frames: (0..count as u64)
                    .map(|i| RgbFrame::new(i, 1, 1, vec![0, 0, 0]))
                    .collect(),
                fail_after: None,
                served: 0,
            }
        }
    }

    impl FrameSource for VecSource {
        fn frame_rate(&self) -> Option<f64> {
            self.frame_rate
        }

        fn next_frame(&mut self) -> ScoringResult<Option<RgbFrame>> {
            if self.fail_after == Some(self.served) {
                return Err(ScoringError::source("decoder error"));
            }
            self.served += 1;
            Ok(self.frames.pop_front())
        }
    }

    fn run(script: Vec<Scripted>) -> ScoringResult<VideoAnalysis> {
        let mut source = VecSource::new(script.len());
        let detector = ScriptedDetector { script };
        FeaturePipeline::default().extract(&mut source, &detector)
    }

    #[test]
    fn test_end_to_end_filters_undetected_frames() {
        use Scripted::*;
        let layouts = vec![
            vec![Distance(40.0), Distance(70.0), Distance(70.0), Nothing, Nothing],
            vec![Nothing, Nothing, Distance(40.0), Distance(70.0), Distance(70.0)],
            vec![Nothing, Distance(40.0), Distance(70.0), Distance(70.0), Nothing],
        ];

        for script in layouts {
            let analysis = run(script).unwrap();
            let summary = analysis.summary;
            assert!((summary.mean_distance - 60.0).abs() < 1e-9);
            assert!((summary.std_distance - 200f64.sqrt()).abs() < 1e-9);
            assert!((summary.airtime_seconds - 2.0 / 30.0).abs() < 1e-12);
            assert_eq!(analysis.stats.frames_total, 5);
            assert_eq!(analysis.stats.frames_detected, 3);
            assert_eq!(analysis.stats.frames_without_detection, 2);
            assert_eq!(analysis.stats.airborne_frames, 2);
        }
    }

    #[test]
    fn test_gap_inside_jump_is_bridged() {
        use Scripted::*;
        let analysis = run(vec![
            Distance(10.0),
            Distance(60.0),
            Nothing,
            Distance(60.0),
            Distance(10.0),
        ])
        .unwrap();
        assert_eq!(analysis.stats.airborne_frames, 3);
        assert!((analysis.summary.airtime_seconds - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_bad_frames_are_skipped() {
        use Scripted::*;
        let analysis = run(vec![Fail, Truncated, Distance(20.0), Nothing]).unwrap();
        assert_eq!(analysis.stats.frames_detector_failed, 1);
        assert_eq!(analysis.stats.frames_insufficient_landmarks, 1);
        assert_eq!(analysis.stats.frames_detected, 1);
        assert_eq!(analysis.summary.mean_distance, 20.0);
    }

    #[test]
    fn test_no_detections() {
        use Scripted::*;
        let err = run(vec![Nothing, Truncated, Fail]).unwrap_err();
        assert!(matches!(err, ScoringError::NoDetections));
        assert!(matches!(run(vec![]).unwrap_err(), ScoringError::NoDetections));
    }

    #[test]
    fn test_source_failure_mid_stream_is_tolerated() {
        use Scripted::*;
        let mut source = VecSource::new(4);
        source.fail_after = Some(2);
        let detector = ScriptedDetector {
            script: vec![Distance(5.0), Distance(15.0), Distance(25.0), Distance(35.0)],
        };
        let analysis = FeaturePipeline::default()
            .extract(&mut source, &detector)
            .unwrap();
        assert_eq!(analysis.stats.frames_total, 2);
        assert_eq!(analysis.summary.mean_distance, 10.0);
    }

    #[test]
    fn test_source_failure_before_first_frame_propagates() {
        let mut source = VecSource::new(3);
        source.fail_after = Some(0);
        let detector = ScriptedDetector { script: vec![] };
        let err = FeaturePipeline::default()
            .extract(&mut source, &detector)
            .unwrap_err();
        assert!(matches!(err, ScoringError::Source(_)));
    }

    #[test]
    fn test_missing_frame_rate_uses_fallback() {
        use Scripted::*;
        let mut source = VecSource::new(2);
        source.frame_rate = None;
        let detector = ScriptedDetector {
            script: vec![Distance(60.0), Distance(60.0)],
        };
        let analysis = FeaturePipeline::default()
            .extract(&mut source, &detector)
            .unwrap();
        assert_eq!(analysis.stats.frame_rate, 30.0);
        assert!((analysis.summary.airtime_seconds - 2.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_trick_fails_before_decoding() {
        let scorer =
            TrickScorer::from_config(&ScoringConfig::default(), Arc::new(ReferenceProfileStore::builtin()))
                .unwrap();
        let mut source = VecSource::new(3);
        // Any detector call would index out of bounds.
        let detector = ScriptedDetector { script: vec![] };

        let err = scorer.score_video("heelflip", &mut source, &detector).unwrap_err();
        assert!(matches!(err, ScoringError::UnknownTrick { .. }));
        assert_eq!(source.served, 0);
    }

    #[test]
    fn test_score_video_reports_breakdown() {
        use Scripted::*;
        let scorer =
            TrickScorer::from_config(&ScoringConfig::default(), Arc::new(ReferenceProfileStore::builtin()))
                .unwrap();
        let mut source = VecSource::new(4);
        let detector = ScriptedDetector {
            script: vec![Distance(70.0), Distance(90.0), Distance(80.0), Nothing],
        };

        let result = scorer.score_video(" Ollie ", &mut source, &detector).unwrap();
        assert_eq!(result.trick, "ollie");
        assert!(result.score() > 0.0 && result.score() <= 10.0);
        assert_eq!(result.breakdown.contributions.len(), 4);
    }
}
