use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeracityError {
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("NLI error: {0}")]
    Nli(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM temporarily unavailable: {0}")]
    LlmTransient(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },
}

impl IntoResponse for VeracityError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            VeracityError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            VeracityError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            VeracityError::Database(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            VeracityError::Embedding(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            VeracityError::Nli(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            VeracityError::ModelLoad(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            VeracityError::Retrieval(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            VeracityError::Http(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            VeracityError::Json(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            VeracityError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            VeracityError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            VeracityError::Llm(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            VeracityError::LlmUnavailable(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            VeracityError::LlmTransient(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            VeracityError::LlmRateLimit { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, VeracityError>;
