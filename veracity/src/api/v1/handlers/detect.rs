use axum::extract::State;
use axum::Json;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::{DetectRequest, DetectResponse};
use crate::api::AppState;
use crate::error::{Result, VeracityError};

/// `POST /api/v1/detect_hallucination`
///
/// Answers the question, checks the answer against retrieved evidence and
/// returns a corrected answer with citations when it was flagged.
#[utoipa::path(
    post,
    path = "/api/v1/detect_hallucination",
    tag = "detection",
    request_body = DetectRequest,
    responses(
        (status = 200, description = "Checked (and possibly corrected) answer", body = DetectResponse),
        (status = 400, description = "Missing or blank question, or malformed JSON"),
        (status = 500, description = "Detection or correction failed"),
    )
)]
pub async fn detect_hallucination(
    State(state): State<AppState>,
    AppJson(req): AppJson<DetectRequest>,
) -> Result<Json<DetectResponse>> {
    let question = req
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| VeracityError::Validation("Missing 'question' in request body".to_string()))?;

    tracing::info!(question = %question, "Received detection request");

    let outcome = state.pipeline.run(question).await.map_err(|error| {
        tracing::error!(error = %error, "Hallucination pipeline failed");
        error
    })?;

    Ok(Json(outcome.into()))
}
