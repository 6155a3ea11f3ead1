use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::services::history::GalleryEntry;

/// GET /api/v1/gallery — List enhanced images, newest first.
pub async fn list_gallery(State(state): State<AppState>) -> Json<Vec<GalleryEntry>> {
    Json(state.gallery.list().await)
}

/// DELETE /api/v1/gallery/{id} — Remove one gallery entry.
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    match state.gallery.remove(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete gallery entry");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// DELETE /api/v1/gallery — Clear the whole gallery.
pub async fn clear_gallery(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    state.gallery.clear().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to clear gallery");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(StatusCode::NO_CONTENT)
}
