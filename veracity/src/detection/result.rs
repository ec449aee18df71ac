use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use utoipa::ToSchema;

/// How a detection outcome was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    EmptyAnswer,
    NoEvidence,
    Contradiction,
    LowSimilarity,
    Verified,
    GenerationError,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyAnswer => "empty_answer",
            Self::NoEvidence => "no_evidence",
            Self::Contradiction => "contradiction",
            Self::LowSimilarity => "low_similarity",
            Self::Verified => "verified",
            Self::GenerationError => "generation_error",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoEvidenceReason {
    /// The caller supplied no documents.
    NoDocuments,
    /// Documents were supplied but none contained a sentence.
    EmptyDocuments,
}

impl NoEvidenceReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoDocuments => "No evidence documents were provided.",
            Self::EmptyDocuments => "Evidence documents contain no text.",
        }
    }
}

/// Whole-answer outcome. Each variant carries only its own diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    EmptyAnswer,
    NoEvidence(NoEvidenceReason),
    Contradiction {
        problem_claim: String,
        contradictory_evidence: String,
        contradiction_score: f32,
    },
    LowSimilarity {
        problem_claim: String,
        closest_evidence: String,
        max_similarity_score: f32,
    },
    Verified,
    GenerationError {
        error: String,
    },
}

impl Verdict {
    pub fn method(&self) -> DetectionMethod {
        match self {
            Self::EmptyAnswer => DetectionMethod::EmptyAnswer,
            Self::NoEvidence(_) => DetectionMethod::NoEvidence,
            Self::Contradiction { .. } => DetectionMethod::Contradiction,
            Self::LowSimilarity { .. } => DetectionMethod::LowSimilarity,
            Self::Verified => DetectionMethod::Verified,
            Self::GenerationError { .. } => DetectionMethod::GenerationError,
        }
    }

    pub fn is_hallucination(&self) -> bool {
        !matches!(self, Self::EmptyAnswer | Self::Verified)
    }

    /// Method-specific confidence in `[0, 1]`.
    ///
    /// Contradiction reports the contradiction probability; low similarity
    /// reports the distance from the closest evidence. The two scales are not
    /// comparable with each other.
    pub fn confidence_score(&self) -> f32 {
        match self {
            Self::Contradiction {
                contradiction_score,
                ..
            } => contradiction_score.clamp(0.0, 1.0),
            Self::LowSimilarity {
                max_similarity_score,
                ..
            } => (1.0 - max_similarity_score).clamp(0.0, 1.0),
            _ => 1.0,
        }
    }

    /// The offending claim, when the verdict names one.
    pub fn problem_claim(&self) -> Option<&str> {
        match self {
            Self::Contradiction { problem_claim, .. } | Self::LowSimilarity { problem_claim, .. } => {
                Some(problem_claim)
            }
            _ => None,
        }
    }

    /// Diagnostic map for the wire format.
    pub fn details(&self) -> Value {
        match self {
            Self::EmptyAnswer => json!({ "reason": "Answer was empty." }),
            Self::NoEvidence(reason) => json!({ "reason": reason.message() }),
            Self::Contradiction {
                problem_claim,
                contradictory_evidence,
                contradiction_score,
            } => json!({
                "problem_claim": problem_claim,
                "contradictory_evidence": contradictory_evidence,
                "contradiction_score": contradiction_score,
            }),
            Self::LowSimilarity {
                problem_claim,
                closest_evidence,
                max_similarity_score,
            } => json!({
                "problem_claim": problem_claim,
                "reason": "Low similarity to all evidence.",
                "max_similarity_score": max_similarity_score,
                "closest_evidence": closest_evidence,
            }),
            Self::Verified => json!({
                "reason": "All claims in the answer were successfully verified against the evidence."
            }),
            Self::GenerationError { error } => json!({ "error": error }),
        }
    }
}

/// Result of one detection call.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub verdict: Verdict,
    pub raw_answer: String,
    pub evidence_docs: Vec<String>,
}

impl DetectionResult {
    pub fn new(verdict: Verdict, raw_answer: impl Into<String>, evidence_docs: Vec<String>) -> Self {
        Self {
            verdict,
            raw_answer: raw_answer.into(),
            evidence_docs,
        }
    }

    pub fn is_hallucination(&self) -> bool {
        self.verdict.is_hallucination()
    }

    pub fn confidence_score(&self) -> f32 {
        self.verdict.confidence_score()
    }

    pub fn method(&self) -> DetectionMethod {
        self.verdict.method()
    }

    pub fn to_report(&self) -> DetectionReport {
        DetectionReport {
            is_hallucination: self.is_hallucination(),
            confidence_score: self.confidence_score(),
            detection_method: self.method(),
            raw_answer: self.raw_answer.clone(),
            evidence_docs: self.evidence_docs.clone(),
            details: self.verdict.details(),
        }
    }
}

/// Serializable view of a [`DetectionResult`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DetectionReport {
    pub is_hallucination: bool,
    pub confidence_score: f32,
    pub detection_method: DetectionMethod,
    pub raw_answer: String,
    pub evidence_docs: Vec<String>,
    #[schema(value_type = Object)]
    pub details: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_empty_and_verified_pass() {
        let verdicts = [
            Verdict::EmptyAnswer,
            Verdict::NoEvidence(NoEvidenceReason::NoDocuments),
            Verdict::Contradiction {
                problem_claim: "c".into(),
                contradictory_evidence: "e".into(),
                contradiction_score: 0.99,
            },
            Verdict::LowSimilarity {
                problem_claim: "c".into(),
                closest_evidence: "e".into(),
                max_similarity_score: 0.1,
            },
            Verdict::Verified,
            Verdict::GenerationError {
                error: "Error: quota".into(),
            },
        ];

        for verdict in &verdicts {
            let passes = matches!(
                verdict.method(),
                DetectionMethod::EmptyAnswer | DetectionMethod::Verified
            );
            assert_eq!(verdict.is_hallucination(), !passes);
            let confidence = verdict.confidence_score();
            assert!((0.0..=1.0).contains(&confidence));
        }
    }

    #[test]
    fn test_low_similarity_confidence_is_distance() {
        let verdict = Verdict::LowSimilarity {
            problem_claim: "Bananas are yellow.".into(),
            closest_evidence: "The Eiffel Tower is in Paris.".into(),
            max_similarity_score: 0.12,
        };
        assert!((verdict.confidence_score() - 0.88).abs() < 1e-6);
    }

    #[test]
    fn test_negative_similarity_confidence_is_clamped() {
        let verdict = Verdict::LowSimilarity {
            problem_claim: "c".into(),
            closest_evidence: "e".into(),
            max_similarity_score: -0.3,
        };
        assert_eq!(verdict.confidence_score(), 1.0);
    }

    #[test]
    fn test_contradiction_details_and_report() {
        let result = DetectionResult::new(
            Verdict::Contradiction {
                problem_claim: "The capital of France is Berlin.".into(),
                contradictory_evidence: "Paris is the capital of France.".into(),
                contradiction_score: 0.995,
            },
            "The capital of France is Berlin.",
            vec!["Paris is the capital of France.".into()],
        );

        let report = result.to_report();
        assert!(report.is_hallucination);
        assert_eq!(report.detection_method, DetectionMethod::Contradiction);
        assert_eq!(
            report.details["problem_claim"],
            "The capital of France is Berlin."
        );
        assert_eq!(
            report.details["contradictory_evidence"],
            "Paris is the capital of France."
        );

        let wire = serde_json::to_value(&report).unwrap();
        assert_eq!(wire["detection_method"], "contradiction");
    }

    #[test]
    fn test_no_evidence_reasons_differ() {
        assert_ne!(
            Verdict::NoEvidence(NoEvidenceReason::NoDocuments).details(),
            Verdict::NoEvidence(NoEvidenceReason::EmptyDocuments).details()
        );
    }

    #[test]
    fn test_method_display_matches_serde() {
        for method in [
            DetectionMethod::EmptyAnswer,
            DetectionMethod::NoEvidence,
            DetectionMethod::Contradiction,
            DetectionMethod::LowSimilarity,
            DetectionMethod::Verified,
            DetectionMethod::GenerationError,
        ] {
            let wire = serde_json::to_value(method).unwrap();
            assert_eq!(wire, method.to_string());
        }
    }
}
