use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Like `parse_env_or`, but rejects non-finite multipliers and ones below 1.
fn parse_backoff_multiplier_or(var: &str, default: f64) -> f64 {
    let value = parse_env_or(var, default);
    if value.is_finite() && value >= 1.0 {
        value
    } else {
        tracing::warn!(
            "Value {} for {} is not a finite multiplier >= 1. Using default {}.",
            value,
            var,
            default
        );
        default
    }
}

/// Like `parse_env_or`, but rejects values outside `[0, 1]`.
fn parse_unit_interval_or(var: &str, default: f32) -> f32 {
    let value = parse_env_or(var, default);
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        tracing::warn!(
            "Value {} for {} is outside [0, 1]. Using default {}.",
            value,
            var,
            default
        );
        default
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub embeddings: EmbeddingsConfig,
    pub nli: NliConfig,
    pub detection: DetectionConfig,
    pub retrieval: RetrievalConfig,
    pub llm: Option<LlmConfig>,
    pub correction: Option<LlmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
    /// When false, corrected answers are not persisted.
    pub logging_enabled: bool,
    pub busy_timeout_ms: u64,
    pub journal_mode: String,
    pub synchronous: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "file:hallucination_log.db".to_string(),
            auth_token: None,
            local_path: None,
            logging_enabled: true,
            busy_timeout_ms: 5000,
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub batch_size: usize,
    pub cache_dir: String,
}

/// Natural-language-inference classifier settings.
///
/// The label indices are tied to the checkpoint. They are checked against the
/// model's `id2label` table when the model is loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct NliConfig {
    pub model: String,
    pub onnx_file: String,
    pub cache_dir: String,
    pub max_length: usize,
    pub contradiction_index: usize,
    pub entailment_index: usize,
    pub intra_threads: usize,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct DetectionConfig {
    pub similarity_threshold: f32,
    pub contradiction_threshold: f32,
    pub entailment_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            contradiction_threshold: 0.98,
            entailment_threshold: 0.92,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    pub wikipedia_api_url: String,
    /// Documents fetched from Wikipedia per question.
    pub max_results: usize,
    /// Passages handed to the detector after ranking.
    pub max_evidence_docs: usize,
    pub similarity_threshold: f32,
    pub passage_sentences: usize,
    pub passage_overlap: usize,
    pub timeout_secs: u64,
    pub cache_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            wikipedia_api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            max_results: 5,
            max_evidence_docs: 3,
            similarity_threshold: 0.5,
            passage_sentences: 4,
            passage_overlap: 1,
            timeout_secs: 15,
            cache_size: 256,
        }
    }
}

/// LLM configuration for chat/completion models
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_multiplier: f64,
    /// Upper bound on any single backoff sleep.
    pub retry_max_delay_ms: u64,
    pub temperature: Option<f32>,
}

impl LlmConfig {
    fn from_env(model: String) -> Self {
        Self {
            model,
            api_key: env::var("LLM_API_KEY").ok(),
            base_url: env::var("LLM_BASE_URL").ok(),
            timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
            max_retries: parse_env_or("LLM_MAX_RETRIES", 3),
            retry_base_delay_ms: parse_env_or("LLM_RETRY_BASE_DELAY_MS", 1000),
            retry_multiplier: parse_backoff_multiplier_or("LLM_RETRY_MULTIPLIER", 2.0),
            retry_max_delay_ms: parse_env_or("LLM_RETRY_MAX_DELAY_MS", 30_000),
            temperature: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let llm = env::var("LLM_MODEL").ok().map(LlmConfig::from_env);

        // Correction runs deterministically; it reuses the generator settings
        // unless a dedicated model is named.
        let correction = env::var("CORRECTION_MODEL")
            .ok()
            .map(LlmConfig::from_env)
            .or_else(|| llm.clone())
            .map(|config| LlmConfig {
                temperature: Some(0.0),
                ..config
            });

        let model_cache_dir =
            env::var("MODEL_CACHE_DIR").unwrap_or_else(|_| ".fastembed_cache".to_string());
        let detection_defaults = DetectionConfig::default();
        let retrieval_defaults = RetrievalConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("VERACITY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("VERACITY_PORT", 5000),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "file:hallucination_log.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
                logging_enabled: !parse_env_or("DISABLE_DB_LOGGING", false),
                busy_timeout_ms: parse_env_or("DATABASE_BUSY_TIMEOUT_MS", 5000),
                journal_mode: env::var("DATABASE_JOURNAL_MODE")
                    .unwrap_or_else(|_| "WAL".to_string()),
                synchronous: env::var("DATABASE_SYNCHRONOUS")
                    .unwrap_or_else(|_| "NORMAL".to_string()),
            },
            embeddings: EmbeddingsConfig {
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "all-MiniLM-L6-v2".to_string()),
                batch_size: parse_env_or("EMBEDDING_BATCH_SIZE", 256),
                cache_dir: model_cache_dir.clone(),
            },
            nli: NliConfig {
                model: env::var("NLI_MODEL")
                    .unwrap_or_else(|_| "Xenova/roberta-large-mnli".to_string()),
                onnx_file: env::var("NLI_ONNX_FILE")
                    .unwrap_or_else(|_| "onnx/model.onnx".to_string()),
                cache_dir: model_cache_dir,
                max_length: parse_env_or("NLI_MAX_LENGTH", 512),
                contradiction_index: parse_env_or("NLI_CONTRADICTION_INDEX", 0),
                entailment_index: parse_env_or("NLI_ENTAILMENT_INDEX", 2),
                intra_threads: parse_env_or("NLI_INTRA_THREADS", 4),
            },
            detection: DetectionConfig {
                similarity_threshold: parse_unit_interval_or(
                    "SIMILARITY_THRESHOLD",
                    detection_defaults.similarity_threshold,
                ),
                contradiction_threshold: parse_unit_interval_or(
                    "CONTRADICTION_THRESHOLD",
                    detection_defaults.contradiction_threshold,
                ),
                entailment_threshold: parse_unit_interval_or(
                    "ENTAILMENT_THRESHOLD",
                    detection_defaults.entailment_threshold,
                ),
            },
            retrieval: RetrievalConfig {
                wikipedia_api_url: env::var("WIKIPEDIA_API_URL")
                    .unwrap_or(retrieval_defaults.wikipedia_api_url),
                max_results: parse_env_or("WIKIPEDIA_MAX_RESULTS", retrieval_defaults.max_results),
                max_evidence_docs: parse_env_or(
                    "MAX_EVIDENCE_DOCS",
                    retrieval_defaults.max_evidence_docs,
                ),
                similarity_threshold: parse_unit_interval_or(
                    "EVIDENCE_SIMILARITY_THRESHOLD",
                    retrieval_defaults.similarity_threshold,
                ),
                passage_sentences: parse_env_or(
                    "PASSAGE_SENTENCES",
                    retrieval_defaults.passage_sentences,
                ),
                passage_overlap: parse_env_or("PASSAGE_OVERLAP", retrieval_defaults.passage_overlap),
                timeout_secs: parse_env_or("RETRIEVAL_TIMEOUT", retrieval_defaults.timeout_secs),
                cache_size: parse_env_or("EVIDENCE_CACHE_SIZE", retrieval_defaults.cache_size),
            },
            llm,
            correction,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio", "gemini"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
