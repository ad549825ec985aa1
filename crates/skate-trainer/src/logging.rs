//! Structured per-video logging for training runs.

use std::path::Path;

use tracing::{error, info, warn, Span};

use skate_models::VideoStats;

/// Logs one training video's lifecycle with the trick and file attached.
#[derive(Debug, Clone)]
pub struct RunLogger {
    trick: String,
    video: String,
}

impl RunLogger {
    pub fn new(trick: &str, video: &Path) -> Self {
        Self {
            trick: trick.to_string(),
            video: video
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| video.display().to_string()),
        }
    }

    pub fn log_start(&self) {
        info!(trick = %self.trick, video = %self.video, "Processing training video");
    }

    pub fn log_recorded(&self, stats: &VideoStats) {
        info!(
            trick = %self.trick,
            video = %self.video,
            frames_detected = stats.frames_detected,
            frames_total = stats.frames_total,
            detection_ratio = stats.detection_ratio(),
            "Training video recorded"
        );
    }

    pub fn log_skipped(&self, reason: &str) {
        warn!(trick = %self.trick, video = %self.video, "Skipped: {}", reason);
    }

    pub fn log_error(&self, message: &str) {
        error!(trick = %self.trick, video = %self.video, "Training video failed: {}", message);
    }

    pub fn video(&self) -> &str {
        &self.video
    }

    /// Span carrying the trick and video for nested pipeline logs.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("training_video", trick = %self.trick, video = %self.video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_uses_file_name() {
        let logger = RunLogger::new("ollie", Path::new("/data/ollie/clip_01.mov"));
        assert_eq!(logger.video(), "clip_01.mov");
    }
}
