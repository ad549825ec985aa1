//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which scorer backs `/submit_run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringBackend {
    /// FFmpeg decoding plus ONNX pose/board models
    Onnx,
    /// Fixed score, no decoding
    Stub,
}

impl FromStr for ScoringBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "onnx" => Ok(Self::Onnx),
            "stub" => Ok(Self::Stub),
            other => Err(format!("unknown scoring backend '{}'", other)),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Max request body size (uploads included)
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// SQLite leaderboard URL
    pub database_url: String,
    /// Reference profile JSON; built-in table when unset or missing
    pub reference_profiles_path: Option<PathBuf>,
    pub scoring_backend: ScoringBackend,
    /// Score returned by the stub backend
    pub stub_score: f64,
    /// Wall-clock budget for scoring one video
    pub scoring_timeout: Duration,
    /// Accepted upload extensions, lowercase, without dot
    pub allowed_video_extensions: Vec<String>,
    /// Directory for temporary upload files
    pub upload_dir: PathBuf,
    /// Default number of leaderboard rows
    pub leaderboard_limit: u32,
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            max_body_size: 200 * 1024 * 1024, // 200MB
            environment: "development".to_string(),
            database_url: "sqlite://leaderboard.db".to_string(),
            reference_profiles_path: None,
            scoring_backend: ScoringBackend::Onnx,
            stub_score: 7.5,
            scoring_timeout: Duration::from_secs(120),
            allowed_video_extensions: vec!["mov".to_string()],
            upload_dir: std::env::temp_dir(),
            leaderboard_limit: 10,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_burst),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            reference_profiles_path: std::env::var("REFERENCE_PROFILES_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            scoring_backend: std::env::var("SCORING_BACKEND")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.scoring_backend),
            stub_score: std::env::var("STUB_SCORE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.stub_score),
            scoring_timeout: Duration::from_secs(
                std::env::var("SCORING_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.scoring_timeout.as_secs()),
            ),
            allowed_video_extensions: std::env::var("ALLOWED_VIDEO_EXTENSIONS")
                .map(|s| {
                    split_list(&s)
                        .into_iter()
                        .map(|e| e.trim_start_matches('.').to_lowercase())
                        .collect()
                })
                .unwrap_or(defaults.allowed_video_extensions),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            leaderboard_limit: std::env::var("LEADERBOARD_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.leaderboard_limit),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Whether a file name carries an accepted video extension.
    pub fn is_allowed_video(&self, file_name: &str) -> bool {
        file_extension(file_name)
            .map(|ext| self.allowed_video_extensions.iter().any(|a| *a == ext))
            .unwrap_or(false)
    }
}

/// Lowercased extension of a file name, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
