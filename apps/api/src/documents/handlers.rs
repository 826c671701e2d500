use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::documents::{parse_resume, ParsedResume};
use crate::errors::AppError;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// POST /api/v1/resumes/upload
///
/// Multipart upload with a `file` field (.pdf, .docx or .txt). Returns the extracted
/// text for use in the chat, matching and coaching endpoints.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ParsedResume>, AppError> {
    let limit_bytes = state.config.max_upload_bytes();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("file field has no file name".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;

        // PDF extraction is CPU-bound; keep it off the async executor.
        let parsed = tokio::task::spawn_blocking(move || {
            parse_resume(&file_name, &bytes, limit_bytes)
        })
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in resume parsing: {e}"))
        })??;
        info!(
            file_name = %parsed.file_name,
            chars = parsed.char_count,
            "Resume uploaded"
        );
        return Ok(Json(parsed));
    }

    Err(AppError::Validation(format!(
        "multipart body must include a '{FILE_FIELD}' field"
    )))
}
