//! Wire types for `POST /api/v1/detect_hallucination`.

use serde::{Deserialize, Serialize};

use crate::detection::DetectionMethod;
use crate::services::PipelineOutcome;

/// Request body. `question` is optional on the wire so a missing field
/// produces the same 400 message as a blank one.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct DetectRequest {
    /// The question to answer and check.
    pub question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DetectResponse {
    pub question: String,
    /// First-pass answer from the generator.
    pub raw_answer: String,
    /// Evidence-grounded answer. Equal to `raw_answer` when nothing was
    /// flagged, `null` when generation failed.
    pub corrected_answer: Option<String>,
    pub confidence_score: f32,
    pub is_hallucination: bool,
    /// `"<first 50 characters>..."` for each evidence passage used.
    pub citations: Vec<String>,
    pub detection_method: DetectionMethod,
}

impl From<PipelineOutcome> for DetectResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        Self {
            question: outcome.question,
            raw_answer: outcome.raw_answer,
            corrected_answer: outcome.corrected_answer,
            confidence_score: outcome.confidence_score,
            is_hallucination: outcome.is_hallucination,
            citations: outcome.citations,
            detection_method: outcome.detection_method,
        }
    }
}
