//! Offline reference building.
//!
//! Collects per-video summaries for one trick (produced by the same
//! [`FeaturePipeline`](crate::pipeline::FeaturePipeline) the online scorer
//! uses) and reduces them to a reference profile.

use tracing::{debug, info};

use skate_models::{normalize_trick_name, ReferenceProfile, ReferenceReport, VideoFeatureSummary};

use crate::aggregate::{mean, population_std};
use crate::error::{ScoringError, ScoringResult};
use crate::pipeline::VideoAnalysis;
use crate::profile::ReferenceProfileStore;

/// Accumulates training summaries for one trick.
#[derive(Debug, Clone)]
pub struct ReferenceBuilder {
    trick: String,
    summaries: Vec<VideoFeatureSummary>,
    skipped: usize,
}

impl ReferenceBuilder {
    pub fn new(trick: &str) -> Self {
        Self {
            trick: normalize_trick_name(trick),
            summaries: Vec::new(),
            skipped: 0,
        }
    }

    pub fn trick(&self) -> &str {
        &self.trick
    }

    /// Add a video's summary.
    pub fn record(&mut self, summary: VideoFeatureSummary) {
        self.summaries.push(summary);
    }

    /// Count a video that yielded no result.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Fold one pipeline outcome in. `NoDetections` counts as skipped; any
    /// other error is returned to the caller.
    pub fn record_outcome(&mut self, outcome: ScoringResult<VideoAnalysis>) -> ScoringResult<()> {
        match outcome {
            Ok(analysis) => {
                self.record(analysis.summary);
                Ok(())
            }
            Err(ScoringError::NoDetections) => {
                debug!(trick = %self.trick, "Training video had no detections, skipping");
                self.record_skipped();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn videos(&self) -> usize {
        self.summaries.len()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Reduce the collected summaries to a report.
    ///
    /// Fails with `EmptyCorpus` when no video contributed.
    pub fn build(&self) -> ScoringResult<ReferenceReport> {
        if self.summaries.is_empty() {
            return Err(ScoringError::EmptyCorpus(self.trick.clone()));
        }

        let column = |feature| {
            self.summaries
                .iter()
                .map(|s| s.feature(feature))
                .collect::<Vec<f64>>()
        };
        let mean_profile = ReferenceProfile::from_fn(|f| mean(&column(f)));
        let std_profile = ReferenceProfile::from_fn(|f| population_std(&column(f)));

        info!(
            trick = %self.trick,
            videos = self.summaries.len(),
            skipped = self.skipped,
            "Reference profile built"
        );

        Ok(ReferenceReport {
            trick: self.trick.clone(),
            videos: self.summaries.len(),
            skipped: self.skipped,
            mean: mean_profile,
            std: std_profile,
        })
    }

    /// Build and write the mean profile into `store`.
    pub fn apply(&self, store: &mut ReferenceProfileStore) -> ScoringResult<ReferenceReport> {
        let report = self.build()?;
        store.upsert(&report.trick, report.mean)?;
        Ok(report)
    }
}
