//! Run submission handler.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use validator::Validate;

use skate_models::{normalize_trick_name, ScoreBreakdown, VideoStats};

use crate::config::file_extension;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Text fields of the submission form.
#[derive(Debug, Default, Validate)]
pub struct SubmitRunForm {
    #[validate(length(min = 1, max = 64, message = "name must be 1-64 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 64, message = "trick_name must be 1-64 characters"))]
    pub trick_name: String,
}

/// Body of a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitRunResponse {
    pub name: String,
    pub trick_name: String,
    pub score: f64,
    pub message: String,
    /// Whether this run replaced the stored score
    pub personal_best: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<VideoStats>,
}

/// An upload written to disk. The file is removed on drop.
struct StoredUpload {
    file_name: String,
    file: NamedTempFile,
}

/// Score an uploaded run and record it on the leaderboard.
///
/// Responds `["success", {...}]`.
pub async fn submit_run(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<(&'static str, SubmitRunResponse)>> {
    let mut form = SubmitRunForm::default();
    let mut upload: Option<StoredUpload> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => form.name = read_text(field).await?,
            "trick_name" => {
                form.trick_name = read_text(field).await?;
                // Fail before any video bytes are written when possible.
                if upload.is_none() && !form.trick_name.is_empty() {
                    state.scoring.ensure_known_trick(&form.trick_name)?;
                }
            }
            "video_file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if !state.config.is_allowed_video(&file_name) {
                    return Err(ApiError::bad_request(format!(
                        "Only {} files are allowed.",
                        allowed_list(&state.config.allowed_video_extensions)
                    )));
                }

                let ext = file_extension(&file_name).unwrap_or_default();
                let file = tempfile::Builder::new()
                    .prefix("run-")
                    .suffix(&format!(".{}", ext))
                    .tempfile_in(&state.config.upload_dir)
                    .map_err(|e| ApiError::internal(format!("Failed to create upload file: {}", e)))?;
                let mut out = tokio::fs::File::from_std(
                    file.reopen()
                        .map_err(|e| ApiError::internal(format!("Failed to open upload file: {}", e)))?,
                );

                let mut written = 0u64;
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?
                {
                    out.write_all(&chunk)
                        .await
                        .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;
                    written += chunk.len() as u64;
                }
                out.flush()
                    .await
                    .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;

                if written == 0 {
                    return Err(ApiError::bad_request("video_file is empty"));
                }
                upload = Some(StoredUpload { file_name, file });
            }
            other => {
                warn!(field = %other, "Ignoring unknown form field");
            }
        }
    }

    form.validate()?;
    let upload = upload.ok_or_else(|| ApiError::bad_request("video_file is required"))?;
    state.scoring.ensure_known_trick(&form.trick_name)?;
    let trick = normalize_trick_name(&form.trick_name);

    let run = state
        .scoring
        .score_file(&trick, upload.file.path())
        .await?;

    let outcome = state
        .leaderboard
        .upload_submission(&form.name, &upload.file_name, &trick, run.score)
        .await?;
    metrics::record_submission(&trick, run.score);

    info!(
        user = %form.name,
        trick = %trick,
        score = run.score,
        personal_best = outcome.personal_best,
        "Run submitted"
    );

    Ok(Json((
        "success",
        SubmitRunResponse {
            message: format!("Run for {}, {} submitted successfully!", form.name, trick),
            name: form.name,
            trick_name: trick,
            score: run.score,
            personal_best: outcome.personal_best,
            breakdown: run.breakdown,
            stats: run.stats,
        },
    )))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map(|s| s.trim().to_string())
        .map_err(|e| ApiError::bad_request(format!("Invalid form field: {}", e)))
}

fn allowed_list(extensions: &[String]) -> String {
    extensions
        .iter()
        .map(|e| format!(".{}", e))
        .collect::<Vec<_>>()
        .join(", ")
}
