use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{Result, VeracityError};
use crate::llm::api::LlmApiClient;
use crate::llm::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAI,
    OpenRouter,
    Ollama,
    LmStudio,
    Gemini,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

/// A configured chat model plus the retry policy wrapped around every call.
#[derive(Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    client: Option<LlmApiClient>,
    model: Option<String>,
    retry: RetryPolicy,
    default_temperature: Option<f32>,
}

impl LlmProvider {
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No LLM configuration provided");
        };

        let (provider, _model) = parse_llm_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "openai" => LlmBackend::OpenAI,
            "openrouter" => LlmBackend::OpenRouter,
            "ollama" => LlmBackend::Ollama,
            "lmstudio" => LlmBackend::LmStudio,
            "gemini" => LlmBackend::Gemini,
            _ => {
                if let Some(base_url) = &config.base_url {
                    LlmBackend::OpenAICompatible {
                        base_url: base_url.clone(),
                    }
                } else {
                    return Self::unavailable(&format!(
                        "Unknown provider in model: {}",
                        config.model
                    ));
                }
            }
        };

        let client = match LlmApiClient::new(config) {
            Ok(client) => client,
            Err(error) => {
                tracing::warn!(model = %config.model, error = %error, "LLM client unavailable");
                return Self::unavailable(&error.to_string());
            }
        };

        Self {
            backend,
            client: Some(client),
            model: Some(config.model.clone()),
            retry: RetryPolicy::from_config(config),
            default_temperature: config.temperature,
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            client: None,
            model: None,
            retry: RetryPolicy::none(),
            default_temperature: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, LlmBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Runs one completion under the retry policy.
    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        let client = match (&self.backend, &self.client) {
            (LlmBackend::Unavailable { reason }, _) => {
                return Err(VeracityError::LlmUnavailable(reason.clone()))
            }
            (_, None) => {
                return Err(VeracityError::LlmUnavailable(
                    "No client available".to_string(),
                ))
            }
            (_, Some(client)) => client,
        };

        let defaults = CompletionOptions {
            temperature: self.default_temperature,
            ..Default::default()
        };
        let options = options.or(Some(&defaults));

        self.retry
            .run(|| client.complete(prompt, system_prompt, options))
            .await
    }
}
