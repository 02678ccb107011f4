use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use serde::Serialize;
use tracing::debug;

use crate::core::{StagedUpload, Upload, validate_content_type};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

const AUDIO_FIELD: &str = "audio_file";
const VOICE_FIELD: &str = "voice_id";

/// Successful conversion response
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    /// Site-relative URL of the converted audio
    pub url: String,
}

fn multipart_error(err: MultipartError, limit_mb: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit_mb }
    } else {
        AppError::InvalidInput(format!("Malformed multipart request: {}", err.body_text()))
    }
}

/// Convert an uploaded recording into the selected voice
///
/// Expects `multipart/form-data` with an `audio_file` part (`audio/*`) and a
/// `voice_id` text part. A valid audio part is staged as soon as it arrives.
/// A non-audio part is skipped unread and reported once the whole form has
/// been checked for missing fields. Unknown parts are skipped.
pub async fn convert_voice(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ConvertResponse>> {
    let mut audio_seen = false;
    let mut staged: Option<StagedUpload> = None;
    let mut rejected: Option<AppError> = None;
    let mut voice_id: Option<String> = None;
    let limit_mb = state.config.max_upload_size_mb;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_mb))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            AUDIO_FIELD => {
                if audio_seen {
                    return Err(AppError::InvalidInput(
                        "Only one audio_file may be uploaded per request.".to_string(),
                    ));
                }
                audio_seen = true;

                if let Err(e) = validate_content_type(field.content_type()) {
                    rejected = Some(e);
                    continue;
                }

                let upload = Upload {
                    content_type: field.content_type().map(str::to_string),
                    original_filename: field.file_name().map(str::to_string),
                    stream: field,
                };
                staged = Some(state.conversion.stage(upload).await?);
            }
            VOICE_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, limit_mb))?;
                voice_id = Some(text);
            }
            other => {
                debug!(field = other, "Ignoring unknown form field");
            }
        }
    }

    if !audio_seen {
        return Err(AppError::MissingField(AUDIO_FIELD.to_string()));
    }
    let voice_id = voice_id
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::MissingField(VOICE_FIELD.to_string()))?;
    if let Some(err) = rejected {
        return Err(err);
    }
    let staged = staged.ok_or_else(|| AppError::MissingField(AUDIO_FIELD.to_string()))?;

    let converted = state.conversion.convert(staged, &voice_id).await?;

    Ok(Json(ConvertResponse {
        success: true,
        url: converted.url,
    }))
}
