// Common test utilities for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use serde_json::json;

use veracity::config::{DatabaseConfig, DetectionConfig, LlmConfig};
use veracity::correction::{AnswerCorrector, Correction};
use veracity::db::{Database, LibSqlBackend};
use veracity::detection::HallucinationDetector;
use veracity::embeddings::Embedder;
use veracity::error::{Result, VeracityError};
use veracity::llm::AnswerGenerator;
use veracity::nli::{NliJudgment, NliPair, NliScorer};
use veracity::retrieval::EvidenceRetriever;

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub const QUESTION: &str = "What is the capital of France?";
pub const PARIS_EVIDENCE: &str = "Paris is the capital and most populous city of France.";
pub const PARIS_ANSWER: &str = "The capital of France is Paris.";
pub const BERLIN_ANSWER: &str = "The capital of France is Berlin.";

pub fn llm_config_with_base_url(model: &str, base_url: String, max_retries: u32) -> LlmConfig {
    LlmConfig {
        model: model.to_string(),
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url),
        timeout_secs: 5,
        max_retries,
        retry_base_delay_ms: 1,
        retry_multiplier: 2.0,
        retry_max_delay_ms: 10,
        temperature: None,
    }
}

pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

pub fn api_error_body(message: &str, error_type: &str, code: &str) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "param": serde_json::Value::Null,
            "code": code
        }
    })
}

/// A log database in a temp file that lives as long as the returned handle.
pub async fn temp_log_store() -> (Arc<LibSqlBackend>, tempfile::NamedTempFile) {
    let temp_file = tempfile::NamedTempFile::new().unwrap();
    let config = DatabaseConfig {
        url: format!("file:{}", temp_file.path().display()),
        ..DatabaseConfig::default()
    };
    let backend = LibSqlBackend::new(Database::new(&config).await.unwrap());
    (Arc::new(backend), temp_file)
}

/// Contradicts hypotheses mentioning Berlin, entails hypotheses mentioning
/// Paris and is neutral about everything else.
pub struct KeywordNli;

#[async_trait]
impl NliScorer for KeywordNli {
    async fn classify_batch(&self, pairs: Vec<NliPair>) -> Result<Vec<NliJudgment>> {
        Ok(pairs
            .iter()
            .map(|pair| {
                let (contradiction, entailment) = if pair.hypothesis.contains("Berlin") {
                    (0.99, 0.005)
                } else if pair.hypothesis.contains("Paris") {
                    (0.01, 0.97)
                } else {
                    (0.05, 0.05)
                };
                NliJudgment {
                    contradiction,
                    neutral: 1.0 - contradiction - entailment,
                    entailment,
                }
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "keyword-nli"
    }
}

/// Texts about France or Paris point one way, everything else another.
pub struct TopicEmbedder;

#[async_trait]
impl Embedder for TopicEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                if text.contains("France") || text.contains("Paris") {
                    vec![1.0, 0.0]
                } else {
                    vec![0.0, 1.0]
                }
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "topic-embedder"
    }
}

pub fn keyword_detector() -> Arc<HallucinationDetector> {
    Arc::new(HallucinationDetector::new(
        Arc::new(KeywordNli),
        Arc::new(TopicEmbedder),
        DetectionConfig::default(),
    ))
}

pub struct FixedGenerator {
    answer: std::result::Result<String, String>,
}

impl FixedGenerator {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            answer: Err(reason.to_string()),
        }
    }
}

#[async_trait]
impl AnswerGenerator for FixedGenerator {
    async fn generate_answer(&self, _question: &str) -> Result<String> {
        self.answer.clone().map_err(VeracityError::LlmUnavailable)
    }
}

pub struct FixedRetriever {
    evidence: Vec<String>,
    pub calls: AtomicUsize,
}

impl FixedRetriever {
    pub fn new(evidence: &[&str]) -> Self {
        Self {
            evidence: evidence.iter().map(|e| e.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvidenceRetriever for FixedRetriever {
    async fn retrieve_evidence(&self, _question: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.evidence.clone())
    }
}

/// Always corrects to the Paris answer and records what it was given.
#[derive(Default)]
pub struct StubCorrector {
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl AnswerCorrector for StubCorrector {
    async fn correct(
        &self,
        _question: &str,
        raw_answer: &str,
        _evidence: &[String],
    ) -> Result<Correction> {
        self.calls.lock().unwrap().push(raw_answer.to_string());
        Ok(Correction {
            corrected_answer: PARIS_ANSWER.to_string(),
            citations: vec!["Paris is the capital and most populous city of Fra...".to_string()],
            confidence_score: 0.9,
        })
    }
}

// Re-export commonly used crates for convenience
pub use serial_test::serial;
pub use tempfile;
pub use wiremock;
