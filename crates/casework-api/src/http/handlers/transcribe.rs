//! Audio transcription handler.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use casework_core::service::transcription::AudioUpload;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Used when the upload carries no file name.
const DEFAULT_FILE_NAME: &str = "audio.webm";

#[derive(Debug, Serialize)]
pub struct Transcript {
    pub text: String,
}

/// POST /api/v1/transcribe - Multipart `file` field to text.
pub async fn transcribe(
    State(state): State<AppState>,
    _auth: Authenticated,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Transcript>>, AppError> {
    let start = Instant::now();

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read audio file: {e}")))?;

        upload = Some(AudioUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let text = state.transcription_service.transcribe(upload).await?;
    Ok(Json(ApiResponse::success(Transcript { text }, start)))
}
