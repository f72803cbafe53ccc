#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use sqlpractice_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService, CLIENT_ID_HEADER},
    models::ValidationRule,
    services::{
        catalog::ProblemCatalog, executor::SqliteExecutor, query_log::MemoryQueryLogStore,
        storage::MemoryStore, AppState,
    },
};

/// Rows in the fixture table. One in six is in 서초구, the rest in 강남구.
pub const FIXTURE_ROWS: u64 = 24_000;

/// Practice table with every column of the real dataset and enough rows for
/// each bundled problem's canonical answer to validate.
fn fixture_connection() -> Connection {
    let columns: Vec<String> = (1..=39)
        .map(|i| match i {
            38 | 39 => format!("col{} REAL", i),
            _ => format!("col{} TEXT", i),
        })
        .collect();

    let conn = Connection::open_in_memory().expect("in-memory sqlite");
    conn.execute_batch(&format!(
        "CREATE TABLE stores ({});
         WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < {rows})
         INSERT INTO stores (col1, col2, col5, col7, col13, col15, col17, col38, col39)
         SELECT printf('MA%06d', i),
                CASE WHEN i % 10 = 0 THEN '카페' || i ELSE '가게' || i END,
                CASE i % 7
                    WHEN 0 THEN '음식'
                    WHEN 1 THEN '소매'
                    WHEN 2 THEN '생활서비스'
                    WHEN 3 THEN '학문/교육'
                    WHEN 4 THEN '부동산'
                    WHEN 5 THEN '관광/여가/오락'
                    ELSE '숙박'
                END,
                CASE i % 4
                    WHEN 0 THEN '한식'
                    WHEN 1 THEN '커피점/카페'
                    WHEN 2 THEN '종합소매점'
                    ELSE '학원-보습교습입시'
                END,
                '서울특별시',
                CASE WHEN i % 6 = 0 THEN '서초구' ELSE '강남구' END,
                CASE WHEN i % 2 = 0 THEN '역삼동' ELSE '삼성동' END,
                127.0 + i * 0.000001,
                37.5 + i * 0.000001
         FROM n;",
        columns.join(", "),
        rows = FIXTURE_ROWS
    ))
    .expect("seed stores fixture");
    conn
}

/// Bundled catalog with the exact-count problem pointed at the fixture's size.
pub fn fixture_catalog() -> ProblemCatalog {
    let builtin = ProblemCatalog::builtin().expect("bundled catalog");
    let problems = builtin
        .problems()
        .iter()
        .cloned()
        .map(|mut problem| {
            if let ValidationRule::Exact { expected_value } = &mut problem.validation {
                *expected_value = json!(FIXTURE_ROWS);
            }
            problem
        })
        .collect();

    ProblemCatalog::new(builtin.levels().to_vec(), problems).expect("fixture catalog")
}

pub fn create_test_state() -> Arc<AppState> {
    create_test_state_with(fixture_catalog())
}

pub fn create_test_state_with(catalog: ProblemCatalog) -> Arc<AppState> {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let executor = SqliteExecutor::from_connection(fixture_connection(), Duration::from_secs(10));

    Arc::new(
        AppState::with_components(
            Config::default(),
            Arc::new(executor),
            Arc::new(MemoryQueryLogStore::new()),
            Arc::new(MemoryStore::new()),
            catalog,
        )
        .expect("Failed to initialize test app state"),
    )
}

pub fn create_test_app() -> Router {
    create_router(create_test_state())
}

pub fn bearer_token(sub: &str) -> String {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = JwtClaims {
        sub: sub.to_string(),
        name: Some("테스트 사용자".to_string()),
        email: None,
        exp: now + 3600,
        iat: now,
    };
    JwtService::new(&Config::default().jwt_secret)
        .generate_token(&claims)
        .expect("sign test token")
}

/// How a test request identifies its caller.
#[derive(Debug, Clone, Copy)]
pub enum Caller<'a> {
    Anonymous,
    Client(&'a str),
    Token(&'a str),
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Caller<'_>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    builder = match caller {
        Caller::Anonymous => builder,
        Caller::Client(id) => builder.header(CLIENT_ID_HEADER, id),
        Caller::Token(sub) => {
            builder.header("authorization", format!("Bearer {}", bearer_token(sub)))
        }
    };

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, json)
}

pub async fn run_query(app: &Router, caller: Caller<'_>, query: &str) -> (StatusCode, Value) {
    send(app, "POST", "/api/query", caller, Some(json!({ "query": query }))).await
}

pub async fn submit(
    app: &Router,
    caller: Caller<'_>,
    problem_id: u32,
    query: &str,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/api/quiz/problems/{}/submit", problem_id),
        caller,
        Some(json!({ "query": query })),
    )
    .await
}
