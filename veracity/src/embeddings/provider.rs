use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::Embedder;
use crate::config::EmbeddingsConfig;
use crate::error::{Result, VeracityError};

/// Local sentence-embedding model backed by FastEmbed (ONNX Runtime).
#[derive(Clone)]
pub struct EmbeddingProvider {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    batch_size: usize,
}

impl EmbeddingProvider {
    /// Loads the model, downloading it into the cache directory on first use.
    /// Blocks until the model is ready.
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let embedding_model = resolve_embedding_model(&config.model)?;

        let model = TextEmbedding::try_new(
            InitOptions::new(embedding_model)
                .with_cache_dir(PathBuf::from(&config.cache_dir))
                .with_show_download_progress(true),
        )
        .map_err(|e| {
            VeracityError::ModelLoad(format!(
                "Failed to load embedding model '{}': {e}",
                config.model
            ))
        })?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: config.model.clone(),
            batch_size: config.batch_size.max(1),
        })
    }
}

#[async_trait]
impl Embedder for EmbeddingProvider {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let batch_size = self.batch_size;
        tokio::task::spawn_blocking(move || {
            let mut model = model.lock().map_err(|e| {
                VeracityError::Embedding(format!("Embedding model lock poisoned: {e}"))
            })?;
            model
                .embed(texts, Some(batch_size))
                .map_err(|e| VeracityError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| VeracityError::Embedding(format!("Embedding worker failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn resolve_embedding_model(model_name: &str) -> Result<EmbeddingModel> {
    match model_name {
        "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
            Ok(EmbeddingModel::AllMiniLML6V2)
        }
        "all-MiniLM-L12-v2" | "sentence-transformers/all-MiniLM-L12-v2" => {
            Ok(EmbeddingModel::AllMiniLML12V2)
        }
        "BAAI/bge-small-en-v1.5" | "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "BAAI/bge-base-en-v1.5" | "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "BAAI/bge-large-en-v1.5" | "bge-large-en-v1.5" => Ok(EmbeddingModel::BGELargeENV15),
        "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => {
            Ok(EmbeddingModel::NomicEmbedTextV15)
        }
        _ => Err(VeracityError::ModelLoad(format!(
            "Unsupported embedding model: {model_name}. Supported models: all-MiniLM-L6-v2, all-MiniLM-L12-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5, nomic-embed-text-v1.5"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_minilm_aliases() {
        assert!(matches!(
            resolve_embedding_model("all-MiniLM-L6-v2"),
            Ok(EmbeddingModel::AllMiniLML6V2)
        ));
        assert!(matches!(
            resolve_embedding_model("sentence-transformers/all-MiniLM-L6-v2"),
            Ok(EmbeddingModel::AllMiniLML6V2)
        ));
    }

    #[test]
    fn test_resolve_unknown_model_fails_loudly() {
        let result = resolve_embedding_model("not-a-model");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unsupported embedding model"));
    }
}
