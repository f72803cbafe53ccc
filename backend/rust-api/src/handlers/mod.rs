use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::metrics;
use crate::services::AppState;

pub mod account;
pub mod error;
pub mod history;
pub mod query;
pub mod quiz;

/// GET /health - the dataset engine must answer; the stores report their backend.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut dependencies = Map::new();

    let engine = match state.queries.ping().await {
        Ok(()) => component("healthy", "sqlite", None),
        Err(e) => component("unhealthy", "sqlite", Some(e.to_string())),
    };
    let engine_healthy = engine["status"] == "healthy";
    dependencies.insert("engine".to_string(), engine);

    let kv = match state.kv.ping().await {
        Ok(()) => component("healthy", state.kv.backend(), None),
        Err(e) => component("unhealthy", state.kv.backend(), Some(e.to_string())),
    };
    let kv_healthy = kv["status"] == "healthy";
    dependencies.insert("learnerStore".to_string(), kv);

    let logs = match state.query_logs.ping().await {
        Ok(()) => component("healthy", state.query_logs.backend(), None),
        Err(e) => component("unhealthy", state.query_logs.backend(), Some(e.to_string())),
    };
    let logs_healthy = logs["status"] == "healthy";
    dependencies.insert("queryLog".to_string(), logs);

    let (status_code, status) = if !engine_healthy {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    } else if !kv_healthy || !logs_healthy {
        (StatusCode::OK, "degraded")
    } else {
        (StatusCode::OK, "healthy")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "sqlpractice-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": dependencies
        })),
    )
}

fn component(status: &str, backend: &str, error: Option<String>) -> Value {
    let mut result = Map::new();
    result.insert("status".to_string(), json!(status));
    result.insert("backend".to_string(), json!(backend));
    if let Some(error) = error {
        result.insert("error".to_string(), json!(error));
    }
    Value::Object(result)
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Metrics authentication middleware - protects /metrics endpoint with HTTP Basic Auth
pub async fn metrics_auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let decoded = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let credentials = String::from_utf8(decoded).map_err(|_| StatusCode::UNAUTHORIZED)?;

    // Format: username:password
    let expected = std::env::var("METRICS_AUTH").unwrap_or_else(|_| "admin:changeme".to_string());

    if credentials != expected {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
