use axum::{
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;

pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/detect_hallucination",
            post(handlers::detect_hallucination),
        )
        .route("/logs", get(handlers::list_logs))
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router())
}
