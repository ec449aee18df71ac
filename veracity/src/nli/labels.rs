use serde::Deserialize;
use std::collections::HashMap;

use super::NliJudgment;
use crate::error::{Result, VeracityError};

/// Number of classes a three-way NLI head produces.
pub const NLI_CLASSES: usize = 3;

/// Position of each NLI class in the model's logits row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMap {
    pub contradiction: usize,
    pub neutral: usize,
    pub entailment: usize,
}

#[derive(Debug, Deserialize)]
struct ModelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

impl LabelMap {
    /// Builds the map from configured indices. The remaining slot is neutral.
    pub fn from_indices(contradiction: usize, entailment: usize) -> Result<Self> {
        if contradiction >= NLI_CLASSES || entailment >= NLI_CLASSES {
            return Err(VeracityError::ModelLoad(format!(
                "NLI label indices must be below {NLI_CLASSES}, got contradiction={contradiction} entailment={entailment}"
            )));
        }
        if contradiction == entailment {
            return Err(VeracityError::ModelLoad(format!(
                "NLI contradiction and entailment indices must differ, both are {contradiction}"
            )));
        }
        let neutral = (0..NLI_CLASSES)
            .find(|idx| *idx != contradiction && *idx != entailment)
            .ok_or_else(|| VeracityError::ModelLoad("No neutral NLI slot".to_string()))?;

        Ok(Self {
            contradiction,
            neutral,
            entailment,
        })
    }

    /// Checks the configured indices against a model's `config.json`.
    ///
    /// Fails when the model exposes a label table whose names disagree with
    /// the configured positions. A config without `id2label` is accepted with a
    /// warning, since some exports strip it.
    pub fn validate_against_config(&self, config_json: &str) -> Result<()> {
        let config: ModelConfig = serde_json::from_str(config_json).map_err(|e| {
            VeracityError::ModelLoad(format!("Unreadable NLI model config: {e}"))
        })?;

        if config.id2label.is_empty() {
            tracing::warn!("NLI model config has no id2label table; label order is unchecked");
            return Ok(());
        }

        if config.id2label.len() != NLI_CLASSES {
            return Err(VeracityError::ModelLoad(format!(
                "NLI model has {} labels, expected {NLI_CLASSES}",
                config.id2label.len()
            )));
        }

        for (idx, expected) in [
            (self.contradiction, "contradiction"),
            (self.neutral, "neutral"),
            (self.entailment, "entailment"),
        ] {
            let actual = config
                .id2label
                .get(&idx.to_string())
                .map(|label| label.to_lowercase())
                .unwrap_or_default();
            if !actual.starts_with(expected) {
                return Err(VeracityError::ModelLoad(format!(
                    "NLI label {idx} is '{actual}', configured as {expected}"
                )));
            }
        }

        Ok(())
    }

    /// Converts one row of raw logits into probabilities.
    pub fn judgment(&self, logits: &[f32]) -> Result<NliJudgment> {
        if logits.len() != NLI_CLASSES {
            return Err(VeracityError::Nli(format!(
                "Expected {NLI_CLASSES} logits per pair, got {}",
                logits.len()
            )));
        }
        let probs = softmax(logits);
        Ok(NliJudgment {
            contradiction: probs[self.contradiction],
            neutral: probs[self.neutral],
            entailment: probs[self.entailment],
        })
    }
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|x| x / sum).collect()
}
