use std::sync::Arc;
use tokio::sync::OnceCell;

use super::result::Verdict;
use crate::config::DetectionConfig;
use crate::embeddings::{argmax, SimilarityScorer};
use crate::error::{Result, VeracityError};
use crate::nli::{NliPair, NliScorer};

/// Evidence sentences shared read-only by every claim of one detection call.
///
/// Sentence embeddings are computed on first use by the similarity fallback
/// and reused for later claims of the same call.
pub struct EvidencePool {
    sentences: Vec<String>,
    embeddings: OnceCell<Vec<Vec<f32>>>,
}

impl EvidencePool {
    pub fn new(sentences: Vec<String>) -> Self {
        Self {
            sentences,
            embeddings: OnceCell::new(),
        }
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    async fn embeddings(&self, scorer: &SimilarityScorer) -> Result<&[Vec<f32>]> {
        let embeddings = self
            .embeddings
            .get_or_try_init(|| scorer.embed(self.sentences.clone()))
            .await?;
        if embeddings.len() != self.sentences.len() {
            return Err(VeracityError::Embedding(format!(
                "Expected {} evidence embeddings, got {}",
                self.sentences.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }
}

/// Per-claim outcome of the escalation procedure.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// Some evidence sentence entails the claim.
    Entailed { score: f32 },
    /// NLI was inconclusive but the claim is close enough to the evidence.
    SupportedBySimilarity { score: f32 },
    /// The claim fails; the verdict describes why.
    Failed(Verdict),
}

/// Checks one claim against the evidence pool: NLI entailment, then NLI
/// contradiction, then embedding similarity as a fallback.
#[derive(Clone)]
pub struct ClaimVerifier {
    nli: Arc<dyn NliScorer>,
    similarity: SimilarityScorer,
    thresholds: DetectionConfig,
}

impl ClaimVerifier {
    pub fn new(
        nli: Arc<dyn NliScorer>,
        similarity: SimilarityScorer,
        thresholds: DetectionConfig,
    ) -> Self {
        Self {
            nli,
            similarity,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> DetectionConfig {
        self.thresholds
    }

    pub async fn verify(&self, claim: &str, pool: &EvidencePool) -> Result<ClaimOutcome> {
        if pool.is_empty() {
            return Err(VeracityError::Internal(
                "Claim verification requires at least one evidence sentence".to_string(),
            ));
        }

        // One batch per claim: every evidence sentence as premise.
        let pairs: Vec<NliPair> = pool
            .sentences()
            .iter()
            .map(|sentence| NliPair::new(sentence.as_str(), claim))
            .collect();
        let judgments = self.nli.classify_batch(pairs).await?;
        if judgments.len() != pool.sentences().len() {
            return Err(VeracityError::Nli(format!(
                "Expected {} NLI judgments, got {}",
                pool.sentences().len(),
                judgments.len()
            )));
        }

        let entailment: Vec<f32> = judgments.iter().map(|j| j.entailment).collect();
        let (_, max_entailment) = argmax(&entailment)
            .ok_or_else(|| VeracityError::Nli("NLI returned no usable scores".to_string()))?;
        if max_entailment > self.thresholds.entailment_threshold {
            tracing::info!(claim = %claim, score = max_entailment, "Claim entailed by evidence");
            return Ok(ClaimOutcome::Entailed {
                score: max_entailment,
            });
        }

        let contradiction: Vec<f32> = judgments.iter().map(|j| j.contradiction).collect();
        if let Some((idx, max_contradiction)) = argmax(&contradiction) {
            if max_contradiction > self.thresholds.contradiction_threshold {
                tracing::warn!(
                    claim = %claim,
                    score = max_contradiction,
                    "Contradiction detected"
                );
                return Ok(ClaimOutcome::Failed(Verdict::Contradiction {
                    problem_claim: claim.to_string(),
                    contradictory_evidence: pool.sentences()[idx].clone(),
                    contradiction_score: max_contradiction,
                }));
            }
        }

        let evidence_embeddings = pool.embeddings(&self.similarity).await?;
        let similarities = self
            .similarity
            .score_embedded(claim, evidence_embeddings)
            .await?;
        let (idx, max_similarity) = argmax(&similarities).ok_or_else(|| {
            VeracityError::Embedding("Similarity scoring returned no usable scores".to_string())
        })?;

        if max_similarity < self.thresholds.similarity_threshold {
            tracing::warn!(
                claim = %claim,
                score = max_similarity,
                "Claim has low similarity to all evidence"
            );
            return Ok(ClaimOutcome::Failed(Verdict::LowSimilarity {
                problem_claim: claim.to_string(),
                closest_evidence: pool.sentences()[idx].clone(),
                max_similarity_score: max_similarity,
            }));
        }

        tracing::info!(
            claim = %claim,
            score = max_similarity,
            "Claim supported by similarity"
        );
        Ok(ClaimOutcome::SupportedBySimilarity {
            score: max_similarity,
        })
    }
}
