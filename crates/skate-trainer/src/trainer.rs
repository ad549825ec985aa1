//! Reference training run.
//!
//! Walks the training directory, runs the shared feature pipeline on every
//! video and folds the results into a [`ReferenceBuilder`]. A video that
//! fails is logged and left out; the run only fails when nothing survives.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, Instrument};

use skate_media::{probe_video, FfmpegFrameSource};
use skate_models::ReferenceReport;
use skate_scoring::{
    DetectorAdapter, FeaturePipeline, ReferenceBuilder, ReferenceProfileStore, ScoringError,
    ScoringResult, VideoAnalysis,
};

use crate::config::TrainerConfig;
use crate::error::{TrainerError, TrainerResult};
use crate::logging::RunLogger;

/// What happened to one training video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOutcome {
    Recorded,
    /// No frame had both a skater and a board
    Skipped,
    Failed,
}

/// Tally of a training run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTally {
    pub recorded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunTally {
    fn add(&mut self, outcome: VideoOutcome) {
        match outcome {
            VideoOutcome::Recorded => self.recorded += 1,
            VideoOutcome::Skipped => self.skipped += 1,
            VideoOutcome::Failed => self.failed += 1,
        }
    }
}

/// Video files in `dir` with an accepted extension, sorted by path.
pub fn collect_videos(dir: &Path, extensions: &[String]) -> TrainerResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(TrainerError::config_error(format!(
            "video directory {} does not exist",
            dir.display()
        )));
    }

    let mut videos = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let accepted = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|a| a.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if accepted {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

/// Decode one video and extract its features on the blocking pool.
pub async fn analyze_video<D>(
    pipeline: &FeaturePipeline,
    detector: &Arc<D>,
    path: &Path,
) -> ScoringResult<VideoAnalysis>
where
    D: DetectorAdapter + 'static,
{
    let info = probe_video(path).await?;
    let pipeline = pipeline.clone();
    let detector = Arc::clone(detector);
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> ScoringResult<VideoAnalysis> {
        let mut source = FfmpegFrameSource::open(&path, &info)?;
        pipeline.extract(&mut source, &detector)
    })
    .await
    .map_err(|e| ScoringError::source(format!("Extraction task failed: {}", e)))?
}

/// Fold one video's result into the builder.
pub fn fold_outcome(
    builder: &mut ReferenceBuilder,
    outcome: ScoringResult<VideoAnalysis>,
    logger: &RunLogger,
) -> VideoOutcome {
    let stats = outcome.as_ref().ok().map(|a| a.stats);
    match outcome {
        Err(ScoringError::NoDetections) => {
            logger.log_skipped("no detections");
            builder.record_skipped();
            VideoOutcome::Skipped
        }
        other => match builder.record_outcome(other) {
            Ok(()) => {
                if let Some(stats) = stats {
                    logger.log_recorded(&stats);
                }
                VideoOutcome::Recorded
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                VideoOutcome::Failed
            }
        },
    }
}

/// Process every training video for the configured trick.
pub async fn train<D>(
    config: &TrainerConfig,
    pipeline: &FeaturePipeline,
    detector: Arc<D>,
) -> TrainerResult<(ReferenceBuilder, RunTally)>
where
    D: DetectorAdapter + 'static,
{
    let videos = collect_videos(&config.video_dir, &config.video_extensions)?;
    info!(
        trick = %config.trick,
        dir = %config.video_dir.display(),
        videos = videos.len(),
        "Starting reference training"
    );

    let mut builder = ReferenceBuilder::new(&config.trick);
    let mut tally = RunTally::default();

    for path in &videos {
        let logger = RunLogger::new(&config.trick, path);
        logger.log_start();
        let outcome = analyze_video(pipeline, &detector, path)
            .instrument(logger.create_span())
            .await;
        tally.add(fold_outcome(&mut builder, outcome, &logger));
    }

    info!(
        trick = %config.trick,
        recorded = tally.recorded,
        skipped = tally.skipped,
        failed = tally.failed,
        "Training videos processed"
    );
    Ok((builder, tally))
}

/// Write the report and merge the mean profile into the profile file.
///
/// A missing profile file starts from the built-in table.
pub fn write_outputs(config: &TrainerConfig, builder: &ReferenceBuilder) -> TrainerResult<ReferenceReport> {
    let mut store = ReferenceProfileStore::load_or_builtin(&config.profiles_path)?;
    let report = builder.apply(&mut store)?;

    if let Some(parent) = config.report_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&config.report_path, serde_json::to_vec_pretty(&report)?)?;
    store.save(&config.profiles_path)?;

    info!(
        trick = %report.trick,
        videos = report.videos,
        report = %config.report_path.display(),
        profiles = %config.profiles_path.display(),
        "Reference profile written"
    );
    Ok(report)
}
