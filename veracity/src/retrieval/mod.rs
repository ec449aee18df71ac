mod cache;
pub mod keywords;
pub mod passages;
mod wikipedia;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::detection::{SentenceSegmenter, UnicodeSegmenter};
use crate::embeddings::SimilarityScorer;
use crate::error::Result;

pub use cache::EvidenceCache;
pub use wikipedia::WikipediaClient;

/// Supplies evidence passages for a question. An empty list is a valid answer.
#[async_trait]
pub trait EvidenceRetriever: Send + Sync {
    async fn retrieve_evidence(&self, question: &str) -> Result<Vec<String>>;
}

/// Supplies raw, possibly long, documents for a question.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    async fn fetch_documents(&self, question: &str) -> Result<Vec<String>>;
}

/// Fetches documents from a source, cuts them into sentence windows and keeps
/// the windows most similar to the question.
#[derive(Clone)]
pub struct PassageRetriever {
    source: Arc<dyn EvidenceSource>,
    scorer: SimilarityScorer,
    segmenter: Arc<dyn SentenceSegmenter>,
    config: RetrievalConfig,
    cache: Option<EvidenceCache>,
}

impl PassageRetriever {
    pub fn new(
        source: Arc<dyn EvidenceSource>,
        scorer: SimilarityScorer,
        config: RetrievalConfig,
    ) -> Self {
        let cache = EvidenceCache::new(config.cache_size);
        Self {
            source,
            scorer,
            segmenter: Arc::new(UnicodeSegmenter::new()),
            config,
            cache,
        }
    }

    async fn rank(&self, question: &str, documents: &[String]) -> Result<Vec<String>> {
        let passages = passages::chunk_documents(
            self.segmenter.as_ref(),
            documents,
            self.config.passage_sentences,
            self.config.passage_overlap,
        );
        if passages.is_empty() {
            tracing::warn!("Could not extract any passages from the retrieved documents");
            return Ok(Vec::new());
        }

        tracing::debug!(passages = passages.len(), "Ranking passages");
        let scores = self.scorer.score(question, &passages).await?;
        let ranked = passages::rank_passages(
            passages,
            &scores,
            self.config.similarity_threshold,
            self.config.max_evidence_docs,
        );
        if ranked.is_empty() {
            tracing::warn!(
                threshold = self.config.similarity_threshold,
                "No passages met the similarity threshold"
            );
        }
        Ok(ranked)
    }
}

#[async_trait]
impl EvidenceRetriever for PassageRetriever {
    async fn retrieve_evidence(&self, question: &str) -> Result<Vec<String>> {
        if let Some(evidence) = self.cache.as_ref().and_then(|cache| cache.get(question)) {
            tracing::debug!(passages = evidence.len(), "Evidence cache hit");
            return Ok(evidence);
        }

        let documents = match self.source.fetch_documents(question).await {
            Ok(documents) => documents,
            Err(error) => {
                tracing::error!(error = %error, "Evidence source failed");
                Vec::new()
            }
        };

        let mut unique = std::collections::HashSet::new();
        let documents: Vec<String> = documents
            .into_iter()
            .filter(|doc| unique.insert(doc.clone()))
            .collect();
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let evidence = self.rank(question, &documents).await?;
        tracing::info!(passages = evidence.len(), "Retrieved evidence passages");

        if let Some(cache) = &self.cache {
            cache.put(question, evidence.clone());
        }
        Ok(evidence)
    }
}
