/// Analysis endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/analyze/all
/// Authorization: Bearer <token>
/// Content-Type: multipart/form-data; boundary=...
///
/// image: <photo file>
/// audio: <voice recording>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "visualFeedback": ["Wear a collared shirt.", "Raise the camera to eye level."],
///   "voiceFeedback": ["Pause instead of saying \"um\"."]
/// }
/// ```
///
/// Model failures never fail the request; the affected list then holds a
/// single fallback message.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use poise_coach::orchestrator::{AnalysisOutcome, MediaUpload};
use poise_shared::auth::middleware::AuthContext;

/// Multipart field holding the photo
pub const IMAGE_FIELD: &str = "image";

/// Multipart field holding the voice recording
pub const AUDIO_FIELD: &str = "audio";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Analyzes a photo and a voice recording
///
/// # Errors
///
/// - `400 Bad Request`: `image` or `audio` missing or empty
/// - `401 Unauthorized`: Missing or invalid token (rejected by the guard)
/// - `413 Payload Too Large`: Upload above `MAX_UPLOAD_BYTES`
/// - `500 Internal Server Error`: The analysis could not be stored
pub async fn analyze_all(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisOutcome>> {
    let mut image: Option<MediaUpload> = None;
    let mut audio: Option<MediaUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let slot = match field.name() {
            Some(IMAGE_FIELD) => &mut image,
            Some(AUDIO_FIELD) => &mut audio,
            _ => continue,
        };
        if slot.is_some() {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = field.bytes().await?;

        *slot = Some(MediaUpload::new(bytes, content_type));
    }

    let (image, audio) = match (non_empty(image), non_empty(audio)) {
        (Some(image), Some(audio)) => (image, audio),
        (image, audio) => {
            let mut missing = Vec::new();
            if image.is_none() {
                missing.push(IMAGE_FIELD);
            }
            if audio.is_none() {
                missing.push(AUDIO_FIELD);
            }
            return Err(ApiError::BadRequest(format!(
                "Both an image and an audio file are required (missing: {})",
                missing.join(", ")
            )));
        }
    };

    let outcome = state
        .orchestrator
        .analyze(auth.user_id, &image, &audio)
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        analysis_id = %outcome.analysis_id,
        "Analysis completed"
    );

    Ok(Json(outcome))
}

fn non_empty(upload: Option<MediaUpload>) -> Option<MediaUpload> {
    upload.filter(|upload| !upload.bytes.is_empty())
}
