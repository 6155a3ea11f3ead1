use axum::extract::State;
use axum::Json;

use crate::app_state::AppState;
use crate::services::stats::UsageStats;

/// GET /api/v1/stats — Usage statistics snapshot.
pub async fn usage_stats(State(state): State<AppState>) -> Json<UsageStats> {
    Json(state.stats.snapshot().await)
}
