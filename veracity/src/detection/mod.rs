mod detector;
mod result;
mod segmenter;
mod verifier;

pub use detector::HallucinationDetector;
pub use result::{DetectionMethod, DetectionReport, DetectionResult, NoEvidenceReason, Verdict};
pub use segmenter::{segment_all, SentenceSegmenter, UnicodeSegmenter};
pub use verifier::{ClaimOutcome, ClaimVerifier, EvidencePool};
