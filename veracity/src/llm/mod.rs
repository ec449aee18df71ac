mod api;
mod generator;
pub mod prompts;
mod provider;
mod retry;

pub use api::LlmApiClient;
pub use generator::{
    is_generation_error, AnswerGenerator, LlmAnswerGenerator, GENERATION_ERROR_PREFIX,
};
pub use provider::{CompletionOptions, LlmBackend, LlmProvider};
pub use retry::{RetryPolicy, RetryableKind};
