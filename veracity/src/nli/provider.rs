use async_trait::async_trait;
use hf_hub::api::sync::ApiBuilder;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::{
    PaddingParams, PaddingStrategy, Tokenizer, TruncationParams, TruncationStrategy,
};

use super::{LabelMap, NliJudgment, NliPair, NliScorer, NLI_CLASSES};
use crate::config::NliConfig;
use crate::error::{Result, VeracityError};

const TOKENIZER_FILE: &str = "tokenizer.json";
const CONFIG_FILE: &str = "config.json";

struct NliModel {
    session: Session,
    tokenizer: Tokenizer,
    uses_token_type_ids: bool,
}

/// Cross-encoder NLI classifier running an ONNX sequence-classification
/// export through ONNX Runtime.
#[derive(Clone)]
pub struct NliProvider {
    model: Arc<Mutex<NliModel>>,
    labels: LabelMap,
    model_name: String,
}

impl NliProvider {
    /// Resolves the model files (a local directory, or a Hugging Face repo
    /// fetched into the cache), validates the label order and builds the
    /// inference session. Blocks until the model is ready.
    pub fn new(config: &NliConfig) -> Result<Self> {
        let labels = LabelMap::from_indices(config.contradiction_index, config.entailment_index)?;
        let files = ModelFiles::resolve(config)?;

        let config_json = std::fs::read_to_string(&files.config)?;
        labels.validate_against_config(&config_json)?;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(|e| {
            VeracityError::ModelLoad(format!("Failed to load NLI tokenizer: {e}"))
        })?;
        configure_tokenizer(&mut tokenizer, config.max_length)?;

        let session = Session::builder()
            .and_then(|builder| builder.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|builder| builder.with_intra_threads(config.intra_threads.max(1)))
            .and_then(|builder| builder.commit_from_file(&files.onnx))
            .map_err(|e| {
                VeracityError::ModelLoad(format!(
                    "Failed to load NLI model '{}': {e}",
                    config.model
                ))
            })?;

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        tracing::info!(
            model = %config.model,
            max_length = config.max_length,
            contradiction_index = labels.contradiction,
            entailment_index = labels.entailment,
            "NLI model loaded"
        );

        Ok(Self {
            model: Arc::new(Mutex::new(NliModel {
                session,
                tokenizer,
                uses_token_type_ids,
            })),
            labels,
            model_name: config.model.clone(),
        })
    }

    pub fn labels(&self) -> LabelMap {
        self.labels
    }
}

#[async_trait]
impl NliScorer for NliProvider {
    async fn classify_batch(&self, pairs: Vec<NliPair>) -> Result<Vec<NliJudgment>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let labels = self.labels;
        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|e| VeracityError::Nli(format!("NLI model lock poisoned: {e}")))?;
            let logits = model.run(pairs)?;
            logits
                .chunks(NLI_CLASSES)
                .map(|row| labels.judgment(row))
                .collect()
        })
        .await
        .map_err(|e| VeracityError::Nli(format!("NLI worker failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl NliModel {
    /// Tokenizes every pair as one padded batch and returns the flattened
    /// logits, `NLI_CLASSES` values per pair.
    fn run(&mut self, pairs: Vec<NliPair>) -> Result<Vec<f32>> {
        let batch = pairs.len();
        let inputs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|pair| (pair.premise, pair.hypothesis))
            .collect();

        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| VeracityError::Nli(format!("Tokenization failed: {e}")))?;

        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);
        let mut input_ids = Vec::with_capacity(batch * seq_len);
        let mut attention_mask = Vec::with_capacity(batch * seq_len);
        let mut token_type_ids = Vec::with_capacity(batch * seq_len);
        for encoding in &encodings {
            input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            token_type_ids.extend(encoding.get_type_ids().iter().map(|&t| t as i64));
        }
        if input_ids.len() != batch * seq_len {
            return Err(VeracityError::Nli(
                "Tokenizer produced ragged batch; padding is not applied".to_string(),
            ));
        }

        let shape = vec![batch as i64, seq_len as i64];
        let input_ids = tensor(shape.clone(), input_ids)?;
        let attention_mask = tensor(shape.clone(), attention_mask)?;

        let outputs = if self.uses_token_type_ids {
            let token_type_ids = tensor(shape, token_type_ids)?;
            self.session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids,
            ])
        } else {
            self.session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
            ])
        }
        .map_err(|e| VeracityError::Nli(format!("NLI inference failed: {e}")))?;

        let (out_shape, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| VeracityError::Nli(format!("Unexpected NLI output: {e}")))?;

        if out_shape.len() != 2 || out_shape[0] != batch as i64 || out_shape[1] != NLI_CLASSES as i64
        {
            return Err(VeracityError::Nli(format!(
                "Expected logits of shape [{batch}, {NLI_CLASSES}], got {out_shape:?}"
            )));
        }

        Ok(logits.to_vec())
    }
}

fn tensor(shape: Vec<i64>, data: Vec<i64>) -> Result<Tensor<i64>> {
    Tensor::from_array((shape, data))
        .map_err(|e| VeracityError::Nli(format!("Failed to build input tensor: {e}")))
}

/// Pairs are truncated longest-first to `max_length` tokens and padded to the
/// longest pair in the batch.
fn configure_tokenizer(tokenizer: &mut Tokenizer, max_length: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            strategy: TruncationStrategy::LongestFirst,
            ..Default::default()
        }))
        .map_err(|e| VeracityError::ModelLoad(format!("Invalid NLI truncation: {e}")))?;

    let padding = match tokenizer.get_padding() {
        Some(existing) => PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..existing.clone()
        },
        None => {
            let pad_token = "<pad>".to_string();
            let pad_id = tokenizer.token_to_id(&pad_token).unwrap_or(0);
            PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                pad_id,
                pad_token,
                ..Default::default()
            }
        }
    };
    tokenizer.with_padding(Some(padding));
    Ok(())
}

struct ModelFiles {
    onnx: PathBuf,
    tokenizer: PathBuf,
    config: PathBuf,
}

impl ModelFiles {
    fn resolve(config: &NliConfig) -> Result<Self> {
        let local = Path::new(&config.model);
        if local.is_dir() {
            tracing::info!(path = %local.display(), "Loading NLI model from local directory");
            return Ok(Self {
                onnx: local.join(&config.onnx_file),
                tokenizer: local.join(TOKENIZER_FILE),
                config: local.join(CONFIG_FILE),
            });
        }

        tracing::info!(model = %config.model, "Fetching NLI model (first run downloads it)");
        let api = ApiBuilder::new()
            .with_cache_dir(PathBuf::from(&config.cache_dir))
            .with_progress(true)
            .build()
            .map_err(|e| VeracityError::ModelLoad(format!("Model hub unavailable: {e}")))?;
        let repo = api.model(config.model.clone());

        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                VeracityError::ModelLoad(format!(
                    "Failed to fetch '{file}' for NLI model '{}': {e}",
                    config.model
                ))
            })
        };

        Ok(Self {
            onnx: fetch(&config.onnx_file)?,
            tokenizer: fetch(TOKENIZER_FILE)?,
            config: fetch(CONFIG_FILE)?,
        })
    }
}
