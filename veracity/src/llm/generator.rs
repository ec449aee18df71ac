use async_trait::async_trait;

use super::prompts::ANSWER_SYSTEM_PROMPT;
use super::LlmProvider;
use crate::error::Result;

/// Prefix a generator may put on an answer to signal failure in-band.
pub const GENERATION_ERROR_PREFIX: &str = "Error:";

/// Produces a first-pass answer for a question.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate_answer(&self, question: &str) -> Result<String>;

    fn model_name(&self) -> Option<&str> {
        None
    }
}

/// True when an answer is an in-band failure message rather than content.
pub fn is_generation_error(answer: &str) -> bool {
    answer.trim_start().starts_with(GENERATION_ERROR_PREFIX)
}

/// Generates answers with the configured chat model.
#[derive(Clone)]
pub struct LlmAnswerGenerator {
    provider: LlmProvider,
}

impl LlmAnswerGenerator {
    pub fn new(provider: LlmProvider) -> Self {
        Self { provider }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate_answer(&self, question: &str) -> Result<String> {
        self.provider
            .complete(question, Some(ANSWER_SYSTEM_PROMPT), None)
            .await
    }

    fn model_name(&self) -> Option<&str> {
        self.provider.model()
    }
}
