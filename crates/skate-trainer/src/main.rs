//! Reference training binary.

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use skate_media::{DetectorConfig, OnnxDetectorAdapter};
use skate_scoring::{FeaturePipeline, ScoringConfig};
use skate_trainer::{train, write_outputs, TrainerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("skate=info".parse().unwrap())
        .add_directive("ort=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    info!("Starting skate-trainer");

    if let Err(e) = run().await {
        error!("Training failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = TrainerConfig::from_env()?;
    info!("Trainer config: {:?}", config);

    skate_media::check_ffmpeg()?;
    skate_media::check_ffprobe()?;

    let scoring = ScoringConfig::from_env();
    let pipeline = FeaturePipeline::new(&scoring);
    let detector = OnnxDetectorAdapter::load_shared(DetectorConfig::from_env())
        .context("Failed to load detector models")?;

    let (builder, tally) = train(&config, &pipeline, detector).await?;
    let report = write_outputs(&config, &builder)?;

    info!(
        trick = %report.trick,
        videos = report.videos,
        skipped = report.skipped,
        failed = tally.failed,
        "Training complete"
    );
    Ok(())
}
