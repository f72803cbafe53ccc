use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{middlewares::auth::LearnerId, models::HistoryEntry, services::AppState};

use super::error::ApiError;

/// GET /api/history
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
) -> Json<Vec<HistoryEntry>> {
    Json(state.history.list(learner.as_str()).await)
}

/// DELETE /api/history
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
) -> Result<Json<Value>, ApiError> {
    state.history.clear(learner.as_str()).await?;
    Ok(Json(json!({ "success": true })))
}

/// DELETE /api/history/{id}
pub async fn remove_history_entry(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.history.remove(learner.as_str(), &id).await? {
        return Err(ApiError::not_found("기록을 찾을 수 없습니다."));
    }
    Ok(Json(json!({ "success": true })))
}

/// POST /api/history/{id}/favorite
pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
    Path(id): Path<String>,
) -> Result<Json<HistoryEntry>, ApiError> {
    state
        .history
        .toggle_favorite(learner.as_str(), &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("기록을 찾을 수 없습니다."))
}
