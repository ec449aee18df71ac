use std::sync::Arc;

use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::llm::LlmProvider;
use crate::services::HallucinationPipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: HallucinationPipeline,
    /// `None` when correction logging is disabled.
    pub db: Option<Arc<dyn DatabaseBackend>>,
    /// Answer generation model, reported by the health check.
    pub llm: LlmProvider,
    /// Correction model, reported by the health check.
    pub correction_llm: LlmProvider,
}

impl AppState {
    pub fn new(
        config: Config,
        pipeline: HallucinationPipeline,
        db: Option<Arc<dyn DatabaseBackend>>,
        llm: LlmProvider,
        correction_llm: LlmProvider,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
            db,
            llm,
            correction_llm,
        }
    }
}
