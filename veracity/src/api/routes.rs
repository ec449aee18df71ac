use axum::extract::OriginalUri;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::v1;
use super::AppState;
use crate::error::VeracityError;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", v1::router::v1_router())
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Unknown paths get the same JSON error body as every other failure.
async fn not_found(OriginalUri(uri): OriginalUri) -> VeracityError {
    VeracityError::NotFound(format!("No route for {}", uri.path()))
}
