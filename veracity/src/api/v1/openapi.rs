use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Veracity API",
        version = "1.0.0",
        description = "Claim-level hallucination detection and evidence-grounded correction for LLM answers.",
    ),
    paths(
        handlers::health::health_check,
        handlers::detect::detect_hallucination,
        handlers::logs::list_logs,
    ),
    components(schemas(
        crate::detection::DetectionMethod,
        // Detection
        dto::detect::DetectRequest,
        dto::detect::DetectResponse,
        // Logs
        dto::logs::ListLogsQuery,
        dto::logs::LogEntryResponse,
        dto::logs::ListLogsResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::ModelsStatus,
        handlers::health::ThresholdsStatus,
        handlers::health::LlmStatus,
        handlers::health::DatabaseStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "detection", description = "Answer generation, hallucination detection and correction"),
        (name = "logs", description = "Persisted corrections"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
