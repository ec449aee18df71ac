use std::sync::Arc;

use super::result::{DetectionResult, NoEvidenceReason, Verdict};
use super::segmenter::{segment_all, SentenceSegmenter, UnicodeSegmenter};
use super::verifier::{ClaimOutcome, ClaimVerifier, EvidencePool};
use crate::config::DetectionConfig;
use crate::embeddings::{Embedder, SimilarityScorer};
use crate::error::Result;
use crate::nli::NliScorer;

/// Claim-level hallucination detector.
///
/// Splits the answer into claims and the evidence into a sentence pool, then
/// verifies claims in order and stops at the first one that fails. Models are
/// owned by the injected scorers and reused across calls.
#[derive(Clone)]
pub struct HallucinationDetector {
    segmenter: Arc<dyn SentenceSegmenter>,
    verifier: ClaimVerifier,
    nli_model: String,
    embedding_model: String,
}

impl HallucinationDetector {
    pub fn new(
        nli: Arc<dyn NliScorer>,
        embedder: Arc<dyn Embedder>,
        thresholds: DetectionConfig,
    ) -> Self {
        Self::with_segmenter(nli, embedder, thresholds, Arc::new(UnicodeSegmenter::new()))
    }

    pub fn with_segmenter(
        nli: Arc<dyn NliScorer>,
        embedder: Arc<dyn Embedder>,
        thresholds: DetectionConfig,
        segmenter: Arc<dyn SentenceSegmenter>,
    ) -> Self {
        let nli_model = nli.model_name().to_string();
        let embedding_model = embedder.model_name().to_string();
        Self {
            segmenter,
            verifier: ClaimVerifier::new(nli, SimilarityScorer::new(embedder), thresholds),
            nli_model,
            embedding_model,
        }
    }

    pub fn thresholds(&self) -> DetectionConfig {
        self.verifier.thresholds()
    }

    pub fn nli_model(&self) -> &str {
        &self.nli_model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub async fn detect(&self, answer: &str, evidence_docs: &[String]) -> Result<DetectionResult> {
        let evidence = evidence_docs.to_vec();

        if answer.trim().is_empty() {
            return Ok(DetectionResult::new(Verdict::EmptyAnswer, answer, evidence));
        }

        if evidence_docs.is_empty() {
            tracing::warn!("No evidence documents provided");
            return Ok(DetectionResult::new(
                Verdict::NoEvidence(NoEvidenceReason::NoDocuments),
                answer,
                evidence,
            ));
        }

        let pool = EvidencePool::new(segment_all(self.segmenter.as_ref(), evidence_docs));
        if pool.is_empty() {
            tracing::warn!(docs = evidence_docs.len(), "Evidence documents contain no text");
            return Ok(DetectionResult::new(
                Verdict::NoEvidence(NoEvidenceReason::EmptyDocuments),
                answer,
                evidence,
            ));
        }

        let claims = self.segmenter.segment(answer);
        tracing::debug!(
            claims = claims.len(),
            evidence_sentences = pool.sentences().len(),
            "Verifying answer"
        );

        for claim in &claims {
            if let ClaimOutcome::Failed(verdict) = self.verifier.verify(claim, &pool).await? {
                return Ok(DetectionResult::new(verdict, answer, evidence));
            }
        }

        tracing::info!(claims = claims.len(), "Answer verified");
        Ok(DetectionResult::new(Verdict::Verified, answer, evidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DetectionMethod;
    use crate::nli::{NliJudgment, NliPair};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const PARIS: &str = "Paris is the capital of France.";
    const EIFFEL: &str = "The Eiffel Tower is in Paris.";

    fn judgment(contradiction: f32, entailment: f32) -> NliJudgment {
        NliJudgment {
            contradiction,
            neutral: 1.0 - contradiction - entailment,
            entailment,
        }
    }

    /// Scores pairs from a lookup table; unknown pairs are neutral.
    #[derive(Default)]
    struct TableNli {
        table: HashMap<(String, String), NliJudgment>,
        batches: Mutex<Vec<Vec<NliPair>>>,
    }

    impl TableNli {
        fn with(mut self, premise: &str, hypothesis: &str, j: NliJudgment) -> Self {
            self.table
                .insert((premise.to_string(), hypothesis.to_string()), j);
            self
        }

        fn batches(&self) -> Vec<Vec<NliPair>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NliScorer for TableNli {
        async fn classify_batch(&self, pairs: Vec<NliPair>) -> Result<Vec<NliJudgment>> {
            self.batches.lock().unwrap().push(pairs.clone());
            Ok(pairs
                .iter()
                .map(|pair| {
                    self.table
                        .get(&(pair.premise.clone(), pair.hypothesis.clone()))
                        .copied()
                        .unwrap_or_else(|| judgment(0.05, 0.05))
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "table-nli"
        }
    }

    /// Returns fixed vectors per text; unknown text maps to a shared axis.
    #[derive(Default)]
    struct TableEmbedder {
        table: HashMap<String, Vec<f32>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl TableEmbedder {
        fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
            self.table.insert(text.to_string(), vector);
            self
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            self.calls.lock().unwrap().push(texts.clone());
            Ok(texts
                .iter()
                .map(|t| self.table.get(t).cloned().unwrap_or(vec![0.0, 0.0, 1.0]))
                .collect())
        }

        fn model_name(&self) -> &str {
            "table-embedder"
        }
    }

    fn detector(nli: Arc<TableNli>, embedder: Arc<TableEmbedder>) -> HallucinationDetector {
        HallucinationDetector::new(nli, embedder, DetectionConfig::default())
    }

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_blank_answer_is_empty_answer_regardless_of_evidence() {
        let d = detector(Arc::default(), Arc::default());
        for evidence in [docs(&[]), docs(&[PARIS])] {
            let result = d.detect("  \n\t", &evidence).await.unwrap();
            assert!(!result.is_hallucination());
            assert_eq!(result.method(), DetectionMethod::EmptyAnswer);
            assert_eq!(result.confidence_score(), 1.0);
        }
    }

    #[tokio::test]
    async fn test_no_evidence_is_hallucination_for_any_answer() {
        let nli = Arc::new(TableNli::default());
        let d = detector(nli.clone(), Arc::default());
        for answer in ["The capital of France is Paris.", "Bananas are yellow."] {
            let result = d.detect(answer, &[]).await.unwrap();
            assert!(result.is_hallucination());
            assert_eq!(result.method(), DetectionMethod::NoEvidence);
            assert_eq!(result.confidence_score(), 1.0);
        }
        assert!(nli.batches().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_only_evidence_is_no_evidence() {
        let d = detector(Arc::default(), Arc::default());
        let result = d
            .detect("Bananas are yellow.", &docs(&["   ", "\n"]))
            .await
            .unwrap();
        assert_eq!(
            result.verdict,
            Verdict::NoEvidence(NoEvidenceReason::EmptyDocuments)
        );
        assert_eq!(result.evidence_docs.len(), 2);
    }

    #[tokio::test]
    async fn test_entailment_short_circuits_other_checks() {
        let claim = "The capital of France is Paris.";
        // Same pool also contradicts strongly and is dissimilar, but one
        // entailing sentence settles the claim.
        let nli = Arc::new(
            TableNli::default()
                .with(PARIS, claim, judgment(0.0, 0.95))
                .with(EIFFEL, claim, judgment(0.99, 0.0)),
        );
        let embedder = Arc::new(TableEmbedder::default().with(claim, vec![1.0, 0.0, 0.0]));
        let d = detector(nli, embedder.clone());

        let result = d.detect(claim, &docs(&[PARIS, EIFFEL])).await.unwrap();
        assert_eq!(result.verdict, Verdict::Verified);
        assert!(embedder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_contradiction_reports_score_and_evidence() {
        let claim = "The capital of France is Berlin.";
        let nli = Arc::new(
            TableNli::default()
                .with(EIFFEL, claim, judgment(0.40, 0.01))
                .with(PARIS, claim, judgment(0.993, 0.002)),
        );
        let d = detector(nli, Arc::default());

        let result = d.detect(claim, &docs(&[EIFFEL, PARIS])).await.unwrap();
        assert!(result.is_hallucination());
        assert_eq!(result.method(), DetectionMethod::Contradiction);
        assert!((result.confidence_score() - 0.993).abs() < 1e-4);
        assert_eq!(
            result.verdict,
            Verdict::Contradiction {
                problem_claim: claim.to_string(),
                contradictory_evidence: PARIS.to_string(),
                contradiction_score: 0.993,
            }
        );
    }

    #[tokio::test]
    async fn test_low_similarity_names_closest_evidence() {
        let claim = "Bananas are yellow.";
        let embedder = Arc::new(
            TableEmbedder::default()
                .with(claim, vec![1.0, 0.0, 0.0])
                .with(PARIS, vec![0.1, 1.0, 0.0])
                .with(EIFFEL, vec![0.3, 1.0, 0.0]),
        );
        let d = detector(Arc::default(), embedder);

        let result = d.detect(claim, &docs(&[PARIS, EIFFEL])).await.unwrap();
        assert_eq!(result.method(), DetectionMethod::LowSimilarity);
        let Verdict::LowSimilarity {
            problem_claim,
            closest_evidence,
            max_similarity_score,
        } = &result.verdict
        else {
            panic!("expected low similarity, got {:?}", result.verdict);
        };
        assert_eq!(problem_claim, claim);
        assert_eq!(closest_evidence, EIFFEL);
        assert!((result.confidence_score() - (1.0 - max_similarity_score)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_similar_claim_passes_when_nli_is_inconclusive() {
        let claim = "Paris hosts the Eiffel Tower.";
        let embedder = Arc::new(
            TableEmbedder::default()
                .with(claim, vec![1.0, 0.1, 0.0])
                .with(EIFFEL, vec![1.0, 0.0, 0.0]),
        );
        let d = detector(Arc::default(), embedder);

        let result = d.detect(claim, &docs(&[EIFFEL])).await.unwrap();
        assert_eq!(result.verdict, Verdict::Verified);
        assert!(!result.is_hallucination());
    }

    #[tokio::test]
    async fn test_thresholds_are_strict() {
        let thresholds = DetectionConfig::default();
        let claim = "The capital of France is Paris.";
        let nli = Arc::new(TableNli::default().with(
            PARIS,
            claim,
            judgment(0.0, thresholds.entailment_threshold),
        ));
        // Entailment equal to the threshold does not count; similarity
        // decides, and the default vector is orthogonal to the claim.
        let embedder = Arc::new(TableEmbedder::default().with(claim, vec![1.0, 0.0, 0.0]));
        let d = detector(nli, embedder);

        let result = d.detect(claim, &docs(&[PARIS])).await.unwrap();
        assert_eq!(result.method(), DetectionMethod::LowSimilarity);
    }

    #[tokio::test]
    async fn test_contradiction_at_threshold_falls_through_to_similarity() {
        let thresholds = DetectionConfig::default();
        let claim = "The capital of France is Paris.";
        let nli = Arc::new(TableNli::default().with(
            PARIS,
            claim,
            judgment(thresholds.contradiction_threshold, 0.0),
        ));
        let embedder = Arc::new(
            TableEmbedder::default()
                .with(claim, vec![1.0, 0.0, 0.0])
                .with(PARIS, vec![1.0, 0.0, 0.0]),
        );
        let d = detector(nli, embedder.clone());

        let result = d.detect(claim, &docs(&[PARIS])).await.unwrap();
        assert_eq!(result.verdict, Verdict::Verified);
        assert!(!embedder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_similarity_at_threshold_is_supported() {
        let claim = "Paris hosts the Eiffel Tower.";
        // cos([1,0,0,0], [1,1,1,1]) = 1 / 2 exactly.
        let embedder = Arc::new(
            TableEmbedder::default()
                .with(claim, vec![1.0, 0.0, 0.0, 0.0])
                .with(EIFFEL, vec![1.0, 1.0, 1.0, 1.0]),
        );
        let config = DetectionConfig {
            similarity_threshold: 0.5,
            ..DetectionConfig::default()
        };
        let d = HallucinationDetector::new(Arc::new(TableNli::default()), embedder, config);

        let result = d.detect(claim, &docs(&[EIFFEL])).await.unwrap();
        assert_eq!(result.verdict, Verdict::Verified);
    }

    #[tokio::test]
    async fn test_contradiction_ties_resolve_to_first_sentence() {
        let claim = "The capital of France is Berlin.";
        let first = "France's capital is Paris.";
        let nli = Arc::new(
            TableNli::default()
                .with(first, claim, judgment(0.99, 0.0))
                .with(PARIS, claim, judgment(0.99, 0.0)),
        );
        let d = detector(nli, Arc::default());

        let result = d.detect(claim, &docs(&[first, PARIS])).await.unwrap();
        assert_eq!(result.verdict.details()["contradictory_evidence"], first);
    }

    #[tokio::test]
    async fn test_first_failing_claim_stops_detection() {
        let ok = "The capital of France is Paris.";
        let bad_one = "The capital of France is Berlin.";
        let bad_two = "The Eiffel Tower is in Rome.";
        let nli = Arc::new(
            TableNli::default()
                .with(PARIS, ok, judgment(0.0, 0.97))
                .with(PARIS, bad_one, judgment(0.99, 0.0))
                .with(PARIS, bad_two, judgment(0.999, 0.0)),
        );
        let d = detector(nli.clone(), Arc::default());

        let answer = format!("{ok} {bad_one} {bad_two}");
        let result = d.detect(&answer, &docs(&[PARIS])).await.unwrap();
        assert_eq!(result.verdict.problem_claim(), Some(bad_one));
        assert_eq!(result.raw_answer, answer);
        // The third claim is never classified.
        assert_eq!(nli.batches().len(), 2);

        let reordered = format!("{ok} {bad_two} {bad_one}");
        let result = d.detect(&reordered, &docs(&[PARIS])).await.unwrap();
        assert_eq!(result.verdict.problem_claim(), Some(bad_two));
    }

    #[tokio::test]
    async fn test_verified_is_order_independent() {
        let claims = [
            "The capital of France is Paris.",
            "Paris is in France.",
            "France has a capital.",
        ];
        let mut nli = TableNli::default();
        for claim in claims {
            nli = nli.with(PARIS, claim, judgment(0.0, 0.96));
        }
        let d = detector(Arc::new(nli), Arc::default());

        for order in [[0, 1, 2], [2, 1, 0], [1, 2, 0]] {
            let answer = order.map(|i| claims[i]).join(" ");
            let result = d.detect(&answer, &docs(&[PARIS])).await.unwrap();
            assert_eq!(result.verdict, Verdict::Verified);
        }
    }

    #[tokio::test]
    async fn test_one_batch_per_claim_covers_whole_pool() {
        let evidence = docs(&[
            "Paris is the capital of France. It lies on the Seine.",
            EIFFEL,
        ]);
        let claim_a = "The capital of France is Paris.";
        let claim_b = "Paris lies on the Seine.";
        let nli = Arc::new(
            TableNli::default()
                .with(PARIS, claim_a, judgment(0.0, 0.99))
                .with("It lies on the Seine.", claim_b, judgment(0.0, 0.99)),
        );
        let d = detector(nli.clone(), Arc::default());

        let result = d
            .detect(&format!("{claim_a} {claim_b}"), &evidence)
            .await
            .unwrap();
        assert_eq!(result.verdict, Verdict::Verified);

        let batches = nli.batches();
        assert_eq!(batches.len(), 2);
        for (batch, claim) in batches.iter().zip([claim_a, claim_b]) {
            let premises: Vec<&str> = batch.iter().map(|p| p.premise.as_str()).collect();
            assert_eq!(premises, vec![PARIS, "It lies on the Seine.", EIFFEL]);
            assert!(batch.iter().all(|p| p.hypothesis == claim));
        }
    }

    #[tokio::test]
    async fn test_evidence_embedded_once_per_call() {
        let claims = ["Paris is lovely.", "Paris is old."];
        let mut embedder = TableEmbedder::default().with(EIFFEL, vec![1.0, 0.0, 0.0]);
        for claim in claims {
            embedder = embedder.with(claim, vec![1.0, 0.1, 0.0]);
        }
        let embedder = Arc::new(embedder);
        let d = detector(Arc::default(), embedder.clone());

        let result = d.detect(&claims.join(" "), &docs(&[EIFFEL])).await.unwrap();
        assert_eq!(result.verdict, Verdict::Verified);

        let evidence_calls = embedder
            .calls()
            .iter()
            .filter(|call| call.as_slice() == [EIFFEL.to_string()])
            .count();
        assert_eq!(evidence_calls, 1);
    }

    #[tokio::test]
    async fn test_detection_is_idempotent() {
        let claim = "The capital of France is Berlin.";
        let nli = Arc::new(TableNli::default().with(PARIS, claim, judgment(0.985, 0.001)));
        let d = detector(nli, Arc::default());

        let first = d.detect(claim, &docs(&[PARIS])).await.unwrap();
        let second = d.detect(claim, &docs(&[PARIS])).await.unwrap();
        assert_eq!(first, second);
    }
}
