use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    middlewares::auth::{AuthUser, JwtClaims},
    models::LogsQuery,
    services::{query_log::DEFAULT_LOG_LIMIT, AppState},
};

use super::error::ApiError;

const MAX_LOG_LIMIT: i64 = 500;

/// GET /api/user - current token claims, or null
pub async fn get_user(claims: Option<Extension<JwtClaims>>) -> Json<Value> {
    Json(json!({ "user": claims.map(|Extension(c)| c) }))
}

/// GET /api/logs - the caller's query log, newest first
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query
        .limit
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .min(MAX_LOG_LIMIT);

    let logs = state.query_logs.recent(&claims.sub, limit).await?;
    Ok(Json(json!({ "logs": logs })))
}

/// GET /api/stats - aggregate over the caller's query log
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let stats = state.query_logs.stats(&claims.sub).await?;
    Ok(Json(json!({ "stats": stats })))
}
