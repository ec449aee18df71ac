use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::llm::{LlmBackend, LlmProvider};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub models: ModelsStatus,
    pub thresholds: ThresholdsStatus,
    pub llm: LlmStatus,
    pub correction: LlmStatus,
    pub database: DatabaseStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ModelsStatus {
    pub nli: String,
    pub embeddings: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ThresholdsStatus {
    pub similarity: f32,
    pub contradiction: f32,
    pub entailment: f32,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LlmStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DatabaseStatus {
    pub status: String,
}

fn llm_status(llm: &LlmProvider) -> LlmStatus {
    let provider = match llm.backend() {
        LlmBackend::OpenAI => "openai",
        LlmBackend::OpenRouter => "openrouter",
        LlmBackend::Ollama => "ollama",
        LlmBackend::LmStudio => "lmstudio",
        LlmBackend::Gemini => "gemini",
        LlmBackend::OpenAICompatible { .. } => "openai-compatible",
        LlmBackend::Unavailable { .. } => {
            return LlmStatus {
                status: "unavailable".to_string(),
                provider: None,
                model: None,
            }
        }
    };
    LlmStatus {
        status: "available".to_string(),
        provider: Some(provider.to_string()),
        model: llm.model().map(str::to_string),
    }
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthData> {
    let detector = state.pipeline.detector();
    let thresholds = detector.thresholds();

    let database = match &state.db {
        None => "disabled",
        Some(db) => match db.ping().await {
            Ok(()) => "ok",
            Err(_) => "error",
        },
    };

    Json(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models: ModelsStatus {
            nli: detector.nli_model().to_string(),
            embeddings: detector.embedding_model().to_string(),
        },
        thresholds: ThresholdsStatus {
            similarity: thresholds.similarity_threshold,
            contradiction: thresholds.contradiction_threshold,
            entailment: thresholds.entailment_threshold,
        },
        llm: llm_status(&state.llm),
        correction: llm_status(&state.correction_llm),
        database: DatabaseStatus {
            status: database.to_string(),
        },
    })
}
