use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse, Stop,
    },
    Client,
};
use reqwest::StatusCode;

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{Result, VeracityError},
    llm::provider::CompletionOptions,
};

/// Providers that serve models locally and accept an empty API key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "local", "lmstudio"];

const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "rate_limit",
    "too many requests",
    "resource exhausted",
    "resource_exhausted",
    "quota",
];

const AUTH_MARKERS: &[&str] = &[
    "unauthorized",
    "forbidden",
    "authentication",
    "invalid api key",
    "invalid_api_key",
];

fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "lmstudio" => "http://localhost:1234/v1",
        "gemini" => "https://generativelanguage.googleapis.com/v1beta/openai",
        _ => "https://api.openai.com/v1",
    }
}

/// How a failed completion should be treated by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    RateLimit,
    Auth,
    Transient,
    Permanent,
}

impl FailureKind {
    fn of(error: &OpenAIError) -> Self {
        match error {
            OpenAIError::Reqwest(error) => match error.status() {
                Some(StatusCode::TOO_MANY_REQUESTS) => Self::RateLimit,
                Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => Self::Auth,
                Some(status) if !status.is_server_error() => Self::Permanent,
                // Connection failures and 5xx.
                _ => Self::Transient,
            },
            OpenAIError::ApiError(error) if mentions_any(error, RATE_LIMIT_MARKERS) => {
                Self::RateLimit
            }
            OpenAIError::ApiError(error) if mentions_any(error, AUTH_MARKERS) => Self::Auth,
            OpenAIError::ApiError(error) if error.r#type.is_none() && error.code.is_none() => {
                Self::Transient
            }
            _ => Self::Permanent,
        }
    }
}

fn mentions_any(error: &ApiError, markers: &[&str]) -> bool {
    let haystack = format!(
        "{} {} {}",
        error.message,
        error.r#type.as_deref().unwrap_or_default(),
        error.code.as_deref().unwrap_or_default()
    )
    .to_lowercase();
    markers.iter().any(|marker| haystack.contains(marker))
}

/// OpenAI-compatible chat completion client.
///
/// Each call makes one logical request and classifies failures into
/// rate-limit, transient and permanent errors; retrying is left to the
/// caller's [`RetryPolicy`](super::RetryPolicy).
#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    model: String,
    base_url: String,
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let (provider, model) = parse_llm_provider_model(&config.model);
        let provider = provider.to_lowercase();

        if !KEYLESS_PROVIDERS.contains(&provider.as_str()) && config.api_key.is_none() {
            return Err(VeracityError::Llm(
                "API key required for this provider".to_string(),
            ));
        }

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(&provider).to_string());
        // "local/<name>" is passed through verbatim.
        let model = if provider == "local" {
            config.model.clone()
        } else {
            model.to_string()
        };

        let timeout = Duration::from_secs(config.timeout_secs);
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                VeracityError::Llm(format!("Failed to create LLM HTTP client: {error}"))
            })?;

        // async-openai retries 5xx and non-quota 429s on its own; cap that
        // loop at the request timeout.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(timeout),
            ..Default::default()
        };

        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_base(base_url.clone())
                .with_api_key(config.api_key.clone().unwrap_or_default()),
        )
        .with_http_client(http_client)
        .with_backoff(backoff);

        Ok(Self {
            client,
            model,
            base_url,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(VeracityError::Validation(
                "Prompt cannot be empty".to_string(),
            ));
        }

        let request = self.build_request(prompt, system_prompt, options)?;
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(into_veracity_error)?;
        first_choice_text(response)
    }

    fn build_request(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<CreateChatCompletionRequest> {
        let invalid = |what: &str, error: OpenAIError| {
            VeracityError::Llm(format!("Invalid {what}: {error}"))
        };

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);
        if let Some(system_prompt) = system_prompt.filter(|value| !value.trim().is_empty()) {
            let message = ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|error| invalid("system prompt", error))?;
            messages.push(message.into());
        }
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|error| invalid("user prompt", error))?;
        messages.push(message.into());

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.model.clone()).messages(messages);

        if let Some(options) = options {
            if let Some(temperature) = options.temperature {
                request.temperature(temperature);
            }
            if let Some(max_tokens) = options.max_tokens {
                request.max_tokens(max_tokens);
            }
            if let Some(top_p) = options.top_p {
                request.top_p(top_p);
            }
            if let Some(stop) = options.stop.as_ref().filter(|values| !values.is_empty()) {
                request.stop(Stop::StringArray(stop.clone()));
            }
        }

        request
            .build()
            .map_err(|error| invalid("LLM completion request", error))
    }
}

fn first_choice_text(response: CreateChatCompletionResponse) -> Result<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| VeracityError::Llm("LLM response contained no choices".to_string()))?;
    let text = choice.message.content.unwrap_or_default();
    let text = text.trim();

    if text.is_empty() {
        return Err(VeracityError::Llm(
            "LLM response contained empty content".to_string(),
        ));
    }
    Ok(text.to_string())
}

fn into_veracity_error(error: OpenAIError) -> VeracityError {
    match FailureKind::of(&error) {
        FailureKind::RateLimit => VeracityError::LlmRateLimit { retry_after: None },
        FailureKind::Auth => VeracityError::Llm(format!("LLM authentication failed: {error}")),
        FailureKind::Transient => VeracityError::LlmTransient(error.to_string()),
        FailureKind::Permanent => match error {
            OpenAIError::InvalidArgument(message) => {
                VeracityError::Llm(format!("Invalid LLM request: {message}"))
            }
            OpenAIError::JSONDeserialize(error) => {
                VeracityError::Llm(format!("Failed to parse LLM response: {error}"))
            }
            other => VeracityError::Llm(format!("LLM request failed: {other}")),
        },
    }
}
