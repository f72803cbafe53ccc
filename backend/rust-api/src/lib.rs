use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(middlewares::auth::CLIENT_ID_HEADER),
        ])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest(
            "/api",
            api_routes()
                .layer(cors)
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    middlewares::auth::optional_auth_middleware,
                )),
        )
        .with_state(app_state)
        .layer(middleware::from_fn(csp_middleware))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Query playground
        .route("/query", post(handlers::query::execute_query))
        .route("/schema", get(handlers::query::get_schema))
        .route("/sample/{column}", get(handlers::query::get_sample))
        // History
        .route(
            "/history",
            get(handlers::history::list_history).delete(handlers::history::clear_history),
        )
        .route(
            "/history/{id}",
            delete(handlers::history::remove_history_entry),
        )
        .route(
            "/history/{id}/favorite",
            post(handlers::history::toggle_favorite),
        )
        // Quiz
        .route("/quiz/levels", get(handlers::quiz::list_levels))
        .route("/quiz/problems", get(handlers::quiz::list_problems))
        .route("/quiz/problems/{id}", get(handlers::quiz::get_problem))
        .route(
            "/quiz/problems/{id}/hints/{n}",
            get(handlers::quiz::get_hint),
        )
        .route(
            "/quiz/problems/{id}/answer",
            get(handlers::quiz::reveal_answer),
        )
        .route(
            "/quiz/problems/{id}/submit",
            post(handlers::quiz::submit_answer),
        )
        .route(
            "/quiz/progress",
            get(handlers::quiz::get_progress).delete(handlers::quiz::reset_progress),
        )
        .route("/quiz/next", get(handlers::quiz::next_problem))
        // Account
        .route("/user", get(handlers::account::get_user))
        .route("/logs", get(handlers::account::get_logs))
        .route("/stats", get(handlers::account::get_stats))
}
