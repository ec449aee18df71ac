mod citations;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::embeddings::{argmax, cosine_similarity, SimilarityScorer};
use crate::error::Result;
use crate::llm::{prompts::correction_prompt, CompletionOptions, LlmProvider};

pub use citations::{citations_for, CITATION_PREVIEW_CHARS};

/// A regenerated answer grounded in the evidence passages.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Correction {
    pub corrected_answer: String,
    pub citations: Vec<String>,
    /// Highest cosine similarity between the corrected answer and any cited
    /// passage, rounded to four decimals. 0.0 without sources.
    pub confidence_score: f32,
}

/// Rewrites a hallucinated answer using only the evidence.
#[async_trait]
pub trait AnswerCorrector: Send + Sync {
    async fn correct(
        &self,
        question: &str,
        raw_answer: &str,
        evidence: &[String],
    ) -> Result<Correction>;
}

/// Answers the question again with every evidence passage stuffed into the
/// prompt, then scores the result against those passages.
#[derive(Clone)]
pub struct CorrectionService {
    llm: LlmProvider,
    scorer: SimilarityScorer,
}

impl CorrectionService {
    pub fn new(llm: LlmProvider, scorer: SimilarityScorer) -> Self {
        Self { llm, scorer }
    }

    pub fn is_available(&self) -> bool {
        self.llm.is_available()
    }

    pub async fn confidence(&self, corrected_answer: &str, sources: &[String]) -> Result<f32> {
        if sources.is_empty() {
            return Ok(0.0);
        }
        let answer_embedding = self.scorer.embed_one(corrected_answer).await?;
        let source_embeddings = self.scorer.embed(sources.to_vec()).await?;
        let scores = cosine_similarity(&answer_embedding, &source_embeddings);
        Ok(argmax(&scores)
            .map(|(_, max)| round4(max))
            .unwrap_or(0.0))
    }
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

#[async_trait]
impl AnswerCorrector for CorrectionService {
    async fn correct(
        &self,
        question: &str,
        raw_answer: &str,
        evidence: &[String],
    ) -> Result<Correction> {
        tracing::info!(
            passages = evidence.len(),
            raw_answer_len = raw_answer.len(),
            "Regenerating answer from evidence"
        );

        let options = CompletionOptions {
            temperature: Some(0.0),
            ..Default::default()
        };
        let corrected_answer = self
            .llm
            .complete(&correction_prompt(question, evidence), None, Some(&options))
            .await?;

        let confidence_score = self.confidence(&corrected_answer, evidence).await?;

        Ok(Correction {
            corrected_answer,
            citations: citations_for(evidence),
            confidence_score,
        })
    }
}
