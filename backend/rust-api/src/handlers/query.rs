use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    middlewares::auth::{JwtClaims, LearnerId},
    models::{QueryRequest, QueryResponse, SchemaInfo},
    services::AppState,
};

use super::error::ApiError;

/// POST /api/query - run a learner query against the practice table
pub async fn execute_query(
    State(state): State<Arc<AppState>>,
    learner: LearnerId,
    claims: Option<Extension<JwtClaims>>,
    AppJson(req): AppJson<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    req.validate()?;

    let actor = claims.map(|Extension(c)| c.sub);
    let result = state.queries.run(&req.query, actor.as_deref()).await?;

    if let Err(e) = state
        .history
        .add(learner.as_str(), &req.query, &result)
        .await
    {
        tracing::warn!("Failed to record history for {}: {}", learner.as_str(), e);
    }

    Ok(Json(QueryResponse {
        success: true,
        row_count: result.row_count,
        execution_time: result.execution_time,
        data: result.rows,
    }))
}

/// GET /api/schema
pub async fn get_schema(State(state): State<Arc<AppState>>) -> Result<Json<SchemaInfo>, ApiError> {
    let schema = state.queries.schema().await.map_err(|e| {
        tracing::error!("Failed to load schema: {}", e);
        ApiError::Internal(e.to_string())
    })?;
    Ok(Json(schema))
}

/// GET /api/sample/{column} - a few distinct values of one column
pub async fn get_sample(
    State(state): State<Arc<AppState>>,
    Path(column): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    match state.queries.sample(&column).await {
        Ok(Some(values)) => Ok(Json(values)),
        Ok(None) => Err(ApiError::not_found(format!(
            "알 수 없는 컬럼입니다: {}",
            column
        ))),
        Err(e) => {
            tracing::error!("Failed to sample column {}: {}", column, e);
            Err(ApiError::Internal(e.to_string()))
        }
    }
}
