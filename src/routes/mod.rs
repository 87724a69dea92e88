use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::AppResult,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
};

pub mod learning_items;
pub mod recommendations;
pub mod state;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/db", get(database_health))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/recommendations/users/:user_id",
            get(recommendations::recommend),
        )
        .route(
            "/users/:user_id/learning-items",
            get(learning_items::list_public),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Storage connectivity check
async fn database_health(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let user_count = state.store.count_users().await?;
    Ok(Json(json!({ "status": "healthy", "user_count": user_count })))
}
