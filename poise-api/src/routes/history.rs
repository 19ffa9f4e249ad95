/// Analysis history endpoint
///
/// # Endpoint
///
/// ```text
/// GET /api/analyses/history
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// Every analysis of the authenticated user, newest first:
///
/// ```json
/// [
///   {
///     "id": "uuid",
///     "owner": "uuid",
///     "image": "/9j/4AAQ...",
///     "visualFeedback": ["Sit up straight."],
///     "voiceFeedback": ["Slow down a little."],
///     "createdAt": "2025-01-01T10:00:00Z",
///     "updatedAt": "2025-01-01T10:00:00Z"
///   }
/// ]
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use poise_shared::{auth::middleware::AuthContext, models::analysis::Analysis};

/// Lists the caller's analyses
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token (rejected by the guard)
/// - `500 Internal Server Error`: Store failure
pub async fn list_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Analysis>>> {
    let analyses = state.analyses.list_by_owner(auth.user_id).await?;

    tracing::debug!(user_id = %auth.user_id, count = analyses.len(), "Fetched analysis history");

    Ok(Json(analyses))
}
