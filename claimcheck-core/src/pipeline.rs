//! Verification pipeline — the crate's single entry point
//!
//! claim → retrieve → rerank → stance-score per item → aggregate.
//!
//! Callers normalize the claim to English before calling [`VerifyPipeline::verify`]
//! and translate results back for display; language handling never happens
//! here. The response is always `FinalVerdict`-shaped, even under partial
//! backend failure — retrieval outages degrade to an empty evidence list and
//! the fallback routing signal, never a crash.

use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::aggregate::VerdictAggregator;
use crate::config::VerificationConfig;
use crate::models::{EvidenceReport, RerankedEvidence, StanceVerdict, Verdict, VerifyResponse};
use crate::rerank::Reranker;
use crate::retrieve::EvidenceRetriever;
use crate::stance::{is_low_information_claim, normalize_claim, StanceScorer};

pub struct VerifyPipeline {
    retriever: Arc<dyn EvidenceRetriever>,
    reranker: Reranker,
    stance: StanceScorer,
    aggregator: VerdictAggregator,
    config: VerificationConfig,
}

impl VerifyPipeline {
    pub fn new(
        retriever: Arc<dyn EvidenceRetriever>,
        reranker: Reranker,
        stance: StanceScorer,
        config: VerificationConfig,
    ) -> Self {
        Self {
            retriever,
            reranker,
            stance,
            aggregator: VerdictAggregator::new(&config),
            config,
        }
    }

    /// Verify one claim. The claim must already be in the working language.
    pub async fn verify(&self, claim_en: &str) -> VerifyResponse {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("verify", %request_id);
        self.verify_inner(claim_en).instrument(span).await
    }

    async fn verify_inner(&self, claim_en: &str) -> VerifyResponse {
        let claim = normalize_claim(claim_en);

        // Stance on a vague claim is meaningless; skip retrieval entirely.
        if is_low_information_claim(&claim) {
            tracing::info!("low-information claim — routing to fallback classifier");
            return fallback_response();
        }

        let candidates = match self
            .retriever
            .retrieve(&claim, self.config.retrieve_top_k as usize)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed — degrading to empty evidence");
                Vec::new()
            }
        };
        tracing::info!(candidates = candidates.len(), "retrieval complete");

        let reranked = self
            .reranker
            .rerank(&claim, candidates, self.config.rerank_top_n as usize)
            .await;

        let stances = self.stance.score_evidence(&claim, &reranked).await;

        let verdict = self.aggregator.aggregate(&stances);
        tracing::info!(
            label = ?verdict.label,
            confidence = verdict.confidence,
            "verdict reached"
        );

        let evidence = if verdict.label == Verdict::UseMlModel {
            // Fallback verdicts ship without evidence; the caller
            // re-classifies from the claim alone.
            Vec::new()
        } else {
            evidence_reports(&reranked, &stances)
        };

        VerifyResponse { verdict, evidence }
    }
}

fn fallback_response() -> VerifyResponse {
    VerifyResponse {
        verdict: crate::models::FinalVerdict {
            label: Verdict::UseMlModel,
            confidence: 0.0,
            best_evidence_ref: None,
        },
        evidence: Vec::new(),
    }
}

/// Join reranked evidence with stance outcomes by fact id, preserving rerank
/// order. Items whose stance scoring was dropped are omitted.
fn evidence_reports(
    reranked: &[RerankedEvidence],
    stances: &[StanceVerdict],
) -> Vec<EvidenceReport> {
    reranked
        .iter()
        .filter_map(|item| {
            let stance = stances
                .iter()
                .find(|s| s.fact_id == item.candidate.fact_id)?;
            Some(EvidenceReport {
                fact_id: item.candidate.fact_id,
                stance: stance.stance,
                stance_confidence: stance.stance_confidence,
                best_sentence: stance.best_sentence.clone(),
                rerank_score: item.rerank_score,
                similarity_score: item.candidate.similarity_score,
            })
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EvidenceCandidate, Stance};
    use crate::testutil::{FakeCrossEncoder, FakeEmbedder, FakeEntailment, FakeRetriever};

    fn candidate(fact_id: i64, summary: &str, similarity: f32, rank: usize) -> EvidenceCandidate {
        EvidenceCandidate {
            fact_id,
            summary: summary.to_string(),
            full_text: None,
            similarity_score: similarity,
            rank_position: rank,
        }
    }

    fn pipeline_with(
        retriever: FakeRetriever,
        embedder: FakeEmbedder,
        cross_encoder: FakeCrossEncoder,
        entailment: FakeEntailment,
    ) -> VerifyPipeline {
        let embedder = Arc::new(embedder);
        VerifyPipeline::new(
            Arc::new(retriever),
            Reranker::new(Arc::new(cross_encoder)),
            StanceScorer::new(embedder, Arc::new(entailment)),
            VerificationConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_low_information_claim_short_circuits_before_retrieval() {
        let pipeline = pipeline_with(
            FakeRetriever::panicking(),
            FakeEmbedder::panicking(),
            FakeCrossEncoder::panicking(),
            FakeEntailment::default(),
        );

        let response = pipeline.verify("it").await;

        assert_eq!(response.verdict.label, Verdict::UseMlModel);
        assert_eq!(response.verdict.confidence, 0.0);
        assert!(response.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_empty_corpus_routes_to_fallback() {
        // Scenario: zero documents — retrieval yields nothing, the stance
        // scorer is never reached, gate 1 fires.
        let pipeline = pipeline_with(
            FakeRetriever::with_candidates(Vec::new()),
            FakeEmbedder::panicking(),
            FakeCrossEncoder::panicking(),
            FakeEntailment::default(),
        );

        let response = pipeline.verify("The Eiffel Tower is in Berlin").await;

        assert_eq!(response.verdict.label, Verdict::UseMlModel);
        assert_eq!(response.verdict.confidence, 0.0);
        assert!(response.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_outage_degrades_to_fallback_response() {
        let pipeline = pipeline_with(
            FakeRetriever::failing(),
            FakeEmbedder::panicking(),
            FakeCrossEncoder::panicking(),
            FakeEntailment::default(),
        );

        let response = pipeline.verify("The Eiffel Tower is in Berlin").await;

        assert_eq!(response.verdict.label, Verdict::UseMlModel);
        assert!(response.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_contradicting_evidence_yields_fake_with_report() {
        let claim = "Vaccines cause autism";
        let sentence = "Multiple studies have found no link between vaccines and autism.";

        let pipeline = pipeline_with(
            FakeRetriever::with_candidates(vec![candidate(42, sentence, 0.82, 0)]),
            FakeEmbedder::default()
                .with_vector(claim, vec![1.0, 0.1])
                .with_vector(sentence, vec![0.95, 0.15]),
            FakeCrossEncoder::default().with_default_score(5.0),
            FakeEntailment::default().with_distribution(sentence, [0.85, 0.10, 0.05]),
        );

        let response = pipeline.verify(claim).await;

        assert_eq!(response.verdict.label, Verdict::Fake);
        assert_eq!(response.verdict.best_evidence_ref, Some(42));
        assert_eq!(response.evidence.len(), 1);

        let report = &response.evidence[0];
        assert_eq!(report.fact_id, 42);
        assert_eq!(report.stance, Stance::Contradict);
        assert_eq!(report.best_sentence, sentence);
        assert!((report.rerank_score - 5.0).abs() < f32::EPSILON);
        assert!((report.similarity_score - 0.82).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_all_neutral_evidence_is_unverified() {
        let claim = "The Great Wall is visible from space";
        let s1 = "The Great Wall winds through northern China.";
        let s2 = "Construction spanned many dynasties.";

        let pipeline = pipeline_with(
            FakeRetriever::with_candidates(vec![
                candidate(1, s1, 0.7, 0),
                candidate(2, s2, 0.6, 1),
            ]),
            FakeEmbedder::default()
                .with_vector(claim, vec![1.0, 0.0])
                .with_vector(s1, vec![0.9, 0.2])
                .with_vector(s2, vec![0.8, 0.3]),
            FakeCrossEncoder::default().with_default_score(1.0),
            FakeEntailment::default()
                .with_distribution(s1, [0.05, 0.90, 0.05])
                .with_distribution(s2, [0.10, 0.85, 0.05]),
        );

        let response = pipeline.verify(claim).await;

        assert_eq!(response.verdict.label, Verdict::Unverified);
        assert_eq!(response.evidence.len(), 2);
        assert!(response.evidence.iter().all(|e| e.stance == Stance::Neutral));
    }

    #[tokio::test]
    async fn test_verify_is_idempotent_with_deterministic_backends() {
        let claim = "Vaccines cause autism";
        let sentence = "Multiple studies have found no link between vaccines and autism.";

        let build = || {
            pipeline_with(
                FakeRetriever::with_candidates(vec![candidate(42, sentence, 0.82, 0)]),
                FakeEmbedder::default()
                    .with_vector(claim, vec![1.0, 0.1])
                    .with_vector(sentence, vec![0.95, 0.15]),
                FakeCrossEncoder::default().with_default_score(5.0),
                FakeEntailment::default().with_distribution(sentence, [0.85, 0.10, 0.05]),
            )
        };

        let first = build().verify(claim).await;
        let second = build().verify(claim).await;

        assert_eq!(first.verdict.label, second.verdict.label);
        assert!((first.verdict.confidence - second.verdict.confidence).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_evidence_list_is_empty_on_fallback_verdict() {
        // Topically unrelated evidence: stances exist but gate 2 fires, and
        // the response must not leak the stale evidence list.
        let claim = "Coffee cures cancer";
        let sentence = "Parliament passed the budget on Tuesday.";

        let pipeline = pipeline_with(
            FakeRetriever::with_candidates(vec![candidate(7, sentence, 0.4, 0)]),
            FakeEmbedder::default()
                .with_vector(claim, vec![1.0, 0.0])
                .with_vector(sentence, vec![0.0, 1.0]),
            FakeCrossEncoder::default().with_default_score(1.0),
            FakeEntailment::default().with_distribution(sentence, [0.1, 0.8, 0.1]),
        );

        let response = pipeline.verify(claim).await;

        assert_eq!(response.verdict.label, Verdict::UseMlModel);
        assert!(response.evidence.is_empty());
    }
}
