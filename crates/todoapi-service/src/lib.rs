//! Todo and authentication HTTP service.
//!
//! # Endpoints
//!
//! JSON:API envelopes (`application/vnd.api+json`):
//!
//! - `POST /api/v1/auth/login` - Check credentials, set session cookies
//! - `POST /api/v1/auth/logout` - Clear session cookies and the stored refresh token
//! - `GET /api/v1/auth/is_authenticated` - Current user
//! - `GET /api/v1/auth/refresh` - New access cookie from the refresh cookie
//! - `GET|POST|PUT|DELETE /api/v1/todo/todo` - Single todo operations
//! - `GET /api/v1/todo/todos` - All todos
//! - `GET /ws` - WebSocket ping/pong gateway
//!
//! Plain responses:
//!
//! - `GET /metrics` - Prometheus metrics endpoint
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

use std::sync::Arc;

use axum::http::{Method, Uri};
use axum::middleware::from_fn_with_state;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use todoapi_service_shared::{
    catch_panic_layer, health_live, health_ready, jsonapi_layer, metrics_handler, ApiError,
    AppState, ErrorLogger, JsonApiPipeline, MetricsLayer, ResourceTypes, TracingErrorLogger,
};

pub mod auth;
pub mod presenter;
pub mod todo;
pub mod ws;

/// Resource types declared per route prefix.
pub fn resource_types() -> ResourceTypes {
    ResourceTypes::new()
        .declare("/api/v1/todo", "todos")
        .declare("/api/v1/auth", "auth")
}

/// The full application router, logging errors through `tracing`.
pub fn app(state: AppState) -> Router {
    app_with_logger(state, Arc::new(TracingErrorLogger))
}

/// The full application router with an explicit error logger.
pub fn app_with_logger(state: AppState, logger: Arc<dyn ErrorLogger>) -> Router {
    let pipeline = Arc::new(JsonApiPipeline::new(resource_types(), logger));

    let api = Router::new()
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/is_authenticated", get(auth::is_authenticated))
        .route("/api/v1/auth/refresh", get(auth::refresh))
        .route(
            "/api/v1/todo/todo",
            get(todo::get_todo)
                .post(todo::add_todo)
                .put(todo::update_todo)
                .delete(todo::delete_todo),
        )
        .route("/api/v1/todo/todos", get(todo::list_todos))
        .route("/ws", get(ws::websocket_handler))
        .fallback(not_found)
        .layer(catch_panic_layer())
        .layer(from_fn_with_state(pipeline, jsonapi_layer));

    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(MetricsLayer)
        .with_state(state)
}

async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("Cannot {} {}", method, uri.path()))
}
