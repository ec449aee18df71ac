mod provider;
mod similarity;

use async_trait::async_trait;

use crate::error::Result;

pub use provider::EmbeddingProvider;
pub use similarity::{argmax, cosine_similarity, SimilarityScorer};

/// Turns text spans into dense vectors.
///
/// Implementations must be deterministic for a fixed model: the same input
/// always yields the same vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    fn model_name(&self) -> &str;
}
