use std::sync::Arc;

use super::Embedder;
use crate::error::{Result, VeracityError};

/// Cosine similarity between `a` and every vector in `candidates`.
///
/// Zero-norm vectors score 0.0. Results are clamped to `[-1, 1]` to absorb
/// floating point drift.
pub fn cosine_similarity(a: &[f32], candidates: &[Vec<f32>]) -> Vec<f32> {
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();

    candidates
        .iter()
        .map(|b| {
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                return 0.0;
            }
            let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
            (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
        })
        .collect()
}

/// Index and value of the largest score. Ties resolve to the lowest index;
/// NaN entries are ignored.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .fold(None, |best, (idx, score)| match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((idx, score)),
        })
}

/// Embeds a query and candidate spans and compares them by cosine similarity.
#[derive(Clone)]
pub struct SimilarityScorer {
    embedder: Arc<dyn Embedder>,
}

impl SimilarityScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.embedder.embed(texts).await
    }

    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VeracityError::Embedding("No embedding generated".to_string()))
    }

    /// One similarity score per candidate, in candidate order.
    pub async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let query_embedding = self.embed_one(query).await?;
        let candidate_embeddings = self.embed(candidates.to_vec()).await?;
        Ok(cosine_similarity(&query_embedding, &candidate_embeddings))
    }

    /// Scores `query` against candidates that were embedded earlier.
    pub async fn score_embedded(
        &self,
        query: &str,
        candidate_embeddings: &[Vec<f32>],
    ) -> Result<Vec<f32>> {
        let query_embedding = self.embed_one(query).await?;
        Ok(cosine_similarity(&query_embedding, candidate_embeddings))
    }
}
