//! Run scoring service.
//!
//! Wraps the scoring engine used by `/submit_run`. The ONNX engine probes the
//! upload, then decodes and scores it on a blocking thread, all under one
//! wall-clock budget. The stub engine returns a fixed score without touching
//! the file, which keeps the API usable on hosts without models or FFmpeg.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use skate_media::{probe_video, DetectorConfig, FfmpegFrameSource, OnnxDetectorAdapter};
use skate_models::{ScoreBreakdown, VideoStats, MAX_SCORE};
use skate_scoring::{ReferenceProfileStore, ScoringConfig, ScoringResult, TrickScore, TrickScorer};

use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Score of one uploaded run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunScore {
    pub score: f64,
    /// Per-feature contributions; absent for the stub engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
    /// Frame accounting; absent for the stub engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<VideoStats>,
}

enum ScoringEngine {
    Onnx {
        scorer: TrickScorer,
        detector: Arc<OnnxDetectorAdapter>,
    },
    Stub {
        score: f64,
    },
}

/// Scores uploaded videos for a named trick.
pub struct ScoringService {
    profiles: Arc<ReferenceProfileStore>,
    engine: ScoringEngine,
    timeout: Duration,
}

impl ScoringService {
    /// Fixed-score engine. The score is clamped to [0, 10].
    pub fn stub(profiles: Arc<ReferenceProfileStore>, score: f64, timeout: Duration) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, MAX_SCORE)
        } else {
            0.0
        };
        Self {
            profiles,
            engine: ScoringEngine::Stub { score },
            timeout,
        }
    }

    /// FFmpeg + ONNX engine. Fails if FFmpeg or the models are unavailable.
    pub fn onnx(
        profiles: Arc<ReferenceProfileStore>,
        scoring: &ScoringConfig,
        detectors: DetectorConfig,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let ffmpeg = skate_media::check_ffmpeg()?;
        let ffprobe = skate_media::check_ffprobe()?;
        let scorer = TrickScorer::from_config(scoring, Arc::clone(&profiles))?;
        let detector = OnnxDetectorAdapter::load_shared(detectors)?;

        info!(
            ffmpeg = %ffmpeg.display(),
            ffprobe = %ffprobe.display(),
            timeout_secs = timeout.as_secs(),
            "ONNX scoring engine ready"
        );

        Ok(Self {
            profiles,
            engine: ScoringEngine::Onnx { scorer, detector },
            timeout,
        })
    }

    pub fn backend_name(&self) -> &'static str {
        match self.engine {
            ScoringEngine::Onnx { .. } => "onnx",
            ScoringEngine::Stub { .. } => "stub",
        }
    }

    /// Known trick names, sorted.
    pub fn tricks(&self) -> Vec<String> {
        self.profiles.tricks()
    }

    pub fn profiles(&self) -> &ReferenceProfileStore {
        &self.profiles
    }

    /// Reject trick names without a reference profile.
    pub fn ensure_known_trick(&self, trick: &str) -> ApiResult<()> {
        self.profiles.lookup(trick)?;
        Ok(())
    }

    /// Score the video at `path` for `trick`.
    pub async fn score_file(&self, trick: &str, path: &Path) -> ApiResult<RunScore> {
        self.ensure_known_trick(trick)?;
        let start = Instant::now();

        let result = match &self.engine {
            ScoringEngine::Stub { score } => Ok(RunScore {
                score: *score,
                breakdown: None,
                stats: None,
            }),
            ScoringEngine::Onnx { scorer, detector } => self
                .score_with_models(scorer, detector, trick, path)
                .await
                .map(|scored| RunScore {
                    score: scored.score(),
                    breakdown: Some(scored.breakdown),
                    stats: Some(scored.stats),
                }),
        };

        metrics::record_scoring_duration(self.backend_name(), start.elapsed().as_secs_f64());
        if matches!(result, Err(ApiError::NoDetections)) {
            metrics::record_no_detections(&skate_models::normalize_trick_name(trick));
        }
        result
    }

    async fn score_with_models(
        &self,
        scorer: &TrickScorer,
        detector: &Arc<OnnxDetectorAdapter>,
        trick: &str,
        path: &Path,
    ) -> ApiResult<TrickScore> {
        let cancel = Arc::new(AtomicBool::new(false));
        let work = probe_and_score(
            scorer.clone(),
            Arc::clone(detector),
            trick.to_string(),
            path.to_path_buf(),
            Arc::clone(&cancel),
        );
        within_budget(self.timeout, &cancel, trick, work).await
    }
}

/// Probe, then decode and score on a blocking thread.
async fn probe_and_score(
    scorer: TrickScorer,
    detector: Arc<OnnxDetectorAdapter>,
    trick: String,
    path: PathBuf,
    cancel: Arc<AtomicBool>,
) -> ApiResult<TrickScore> {
    let info = probe_video(&path).await?;

    let task = tokio::task::spawn_blocking(move || -> ScoringResult<TrickScore> {
        let mut source = FfmpegFrameSource::open(&path, &info)?.with_cancel_flag(cancel);
        scorer.score_video(&trick, &mut source, &detector)
    });

    match task.await {
        Ok(result) => result.map_err(ApiError::from),
        Err(join_err) => Err(ApiError::internal(format!(
            "Scoring task failed: {}",
            join_err
        ))),
    }
}

/// Run `work` under the per-video wall-clock budget.
///
/// On expiry `cancel` is raised so a detached decoder stops at its next frame.
async fn within_budget<T>(
    budget: Duration,
    cancel: &AtomicBool,
    trick: &str,
    work: impl Future<Output = ApiResult<T>>,
) -> ApiResult<T> {
    match tokio::time::timeout(budget, work).await {
        Ok(result) => result,
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            metrics::record_scoring_timeout();
            warn!(
                trick = %trick,
                timeout_secs = budget.as_secs(),
                "Scoring timed out"
            );
            Err(ApiError::Timeout(budget.as_secs()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(score: f64) -> ScoringService {
        ScoringService::stub(
            Arc::new(ReferenceProfileStore::builtin()),
            score,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_stub_scores_known_trick() {
        let service = stub(7.5);
        let run = service
            .score_file("Ollie", Path::new("does-not-matter.mov"))
            .await
            .unwrap();
        assert_eq!(run.score, 7.5);
        assert!(run.breakdown.is_none());
        assert_eq!(service.backend_name(), "stub");
    }

    #[tokio::test]
    async fn test_unknown_trick_is_bad_request() {
        let service = stub(7.5);
        let err = service
            .score_file("heelflip", Path::new("run.mov"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_stub_score_is_clamped() {
        let service = stub(42.0);
        assert!(matches!(service.engine, ScoringEngine::Stub { score } if score == MAX_SCORE));
        let service = stub(f64::NAN);
        assert!(matches!(service.engine, ScoringEngine::Stub { score } if score == 0.0));
    }

    #[tokio::test]
    async fn test_slow_scoring_times_out_and_cancels() {
        let cancel = AtomicBool::new(false);
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        };

        let err = within_budget(Duration::from_millis(20), &cancel, "ollie", slow)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Timeout(0)));
        assert_eq!(err.status_code(), axum::http::StatusCode::GATEWAY_TIMEOUT);
        assert!(cancel.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_work_within_budget_passes_through() {
        let cancel = AtomicBool::new(false);
        let run = within_budget(Duration::from_secs(5), &cancel, "ollie", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(run, 7);

        let err = within_budget(Duration::from_secs(5), &cancel, "ollie", async {
            Err::<(), _>(ApiError::NoDetections)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NoDetections));
        assert!(!cancel.load(Ordering::Relaxed));
    }

    #[test]
    fn test_tricks() {
        assert_eq!(stub(1.0).tricks(), vec!["kickflip".to_string(), "ollie".to_string()]);
    }
}
