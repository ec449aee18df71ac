mod labels;
mod provider;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

pub use labels::{softmax, LabelMap, NLI_CLASSES};
pub use provider::NliProvider;

/// A (premise, hypothesis) pair to classify.
#[derive(Debug, Clone, PartialEq)]
pub struct NliPair {
    pub premise: String,
    pub hypothesis: String,
}

impl NliPair {
    pub fn new(premise: impl Into<String>, hypothesis: impl Into<String>) -> Self {
        Self {
            premise: premise.into(),
            hypothesis: hypothesis.into(),
        }
    }
}

/// Three-way NLI probabilities for one pair. The fields sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NliJudgment {
    pub contradiction: f32,
    pub neutral: f32,
    pub entailment: f32,
}

/// Batch natural-language-inference classifier.
///
/// `classify_batch` runs every pair through the model in a single inference
/// call and returns one judgment per pair, in input order.
#[async_trait]
pub trait NliScorer: Send + Sync {
    async fn classify_batch(&self, pairs: Vec<NliPair>) -> Result<Vec<NliJudgment>>;

    fn model_name(&self) -> &str;
}
