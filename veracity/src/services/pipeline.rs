use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::correction::AnswerCorrector;
use crate::db::{CorrectionLogStore, LogRecord};
use crate::detection::{DetectionMethod, DetectionReport, DetectionResult, HallucinationDetector, Verdict};
use crate::error::Result;
use crate::llm::{is_generation_error, AnswerGenerator, GENERATION_ERROR_PREFIX};
use crate::retrieval::EvidenceRetriever;

/// Everything the pipeline learned about one question.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PipelineOutcome {
    pub question: String,
    pub raw_answer: String,
    /// The evidence-grounded answer. Equal to `raw_answer` when the answer
    /// was not flagged, absent when generation failed.
    pub corrected_answer: Option<String>,
    pub confidence_score: f32,
    pub is_hallucination: bool,
    pub citations: Vec<String>,
    pub detection_method: DetectionMethod,
    pub detection: DetectionReport,
}

/// Question in, checked answer out: generate, retrieve, detect and, when the
/// answer is flagged, correct and log.
#[derive(Clone)]
pub struct HallucinationPipeline {
    generator: Arc<dyn AnswerGenerator>,
    retriever: Arc<dyn EvidenceRetriever>,
    detector: Arc<HallucinationDetector>,
    corrector: Arc<dyn AnswerCorrector>,
    log_store: Option<Arc<dyn CorrectionLogStore>>,
}

impl HallucinationPipeline {
    pub fn new(
        generator: Arc<dyn AnswerGenerator>,
        retriever: Arc<dyn EvidenceRetriever>,
        detector: Arc<HallucinationDetector>,
        corrector: Arc<dyn AnswerCorrector>,
    ) -> Self {
        Self {
            generator,
            retriever,
            detector,
            corrector,
            log_store: None,
        }
    }

    /// Persist every corrected answer to `store`.
    pub fn with_log_store(mut self, store: Arc<dyn CorrectionLogStore>) -> Self {
        self.log_store = Some(store);
        self
    }

    pub fn detector(&self) -> &HallucinationDetector {
        &self.detector
    }

    pub fn logging_enabled(&self) -> bool {
        self.log_store.is_some()
    }

    pub async fn run(&self, question: &str) -> Result<PipelineOutcome> {
        let raw_answer = match self.generator.generate_answer(question).await {
            Ok(answer) if !is_generation_error(&answer) => answer,
            Ok(answer) => {
                tracing::error!(answer = %answer, "Answer generation reported an error");
                return Ok(generation_failure(question, answer));
            }
            Err(error) => {
                tracing::error!(error = %error, "Answer generation failed");
                return Ok(generation_failure(
                    question,
                    format!("{GENERATION_ERROR_PREFIX} {error}"),
                ));
            }
        };

        let evidence = self.retriever.retrieve_evidence(question).await?;
        tracing::debug!(passages = evidence.len(), "Evidence retrieved");

        let detection = self.detector.detect(&raw_answer, &evidence).await?;
        if !detection.is_hallucination() {
            tracing::info!(method = %detection.method(), "Answer accepted");
            return Ok(PipelineOutcome {
                question: question.to_string(),
                corrected_answer: Some(raw_answer.clone()),
                raw_answer,
                confidence_score: detection.confidence_score(),
                is_hallucination: false,
                citations: Vec::new(),
                detection_method: detection.method(),
                detection: detection.to_report(),
            });
        }

        tracing::warn!(
            method = %detection.method(),
            claim = ?detection.verdict.problem_claim(),
            "Hallucination detected, correcting answer"
        );
        let correction = self
            .corrector
            .correct(question, &raw_answer, &evidence)
            .await?;

        if let Some(store) = &self.log_store {
            let record = LogRecord {
                question: question.to_string(),
                raw_answer: raw_answer.clone(),
                corrected_answer: Some(correction.corrected_answer.clone()),
                citations: correction.citations.clone(),
                confidence_score: Some(correction.confidence_score),
                detection_method: Some(detection.method().to_string()),
            };
            if let Err(error) = store.append(&record).await {
                tracing::warn!(error = %error, "Failed to log corrected answer");
            }
        }

        Ok(PipelineOutcome {
            question: question.to_string(),
            raw_answer,
            corrected_answer: Some(correction.corrected_answer),
            confidence_score: correction.confidence_score,
            is_hallucination: true,
            citations: correction.citations,
            detection_method: detection.method(),
            detection: detection.to_report(),
        })
    }
}

fn generation_failure(question: &str, raw_answer: String) -> PipelineOutcome {
    let detection = DetectionResult::new(
        Verdict::GenerationError {
            error: raw_answer.clone(),
        },
        raw_answer.clone(),
        Vec::new(),
    );
    PipelineOutcome {
        question: question.to_string(),
        raw_answer,
        corrected_answer: None,
        confidence_score: detection.confidence_score(),
        is_hallucination: detection.is_hallucination(),
        citations: Vec::new(),
        detection_method: detection.method(),
        detection: detection.to_report(),
    }
}
