//! Reranker — cross-encoder relevance pass over retrieval candidates
//!
//! Scores each (query, candidate-text) pair independently, then keeps the
//! `top_n` best by `(rerank_score, similarity_score)` descending. Similarity
//! is only a tie-break; the sort is stable, so full ties keep index order.

use std::sync::Arc;

use crate::models::{EvidenceCandidate, RerankedEvidence};
use crate::scoring::CrossEncoderBackend;

/// Cross-encoder input is truncated to this many characters.
const MAX_RERANK_CHARS: usize = 1024;

pub struct Reranker {
    cross_encoder: Arc<dyn CrossEncoderBackend>,
}

impl Reranker {
    pub fn new(cross_encoder: Arc<dyn CrossEncoderBackend>) -> Self {
        Self { cross_encoder }
    }

    /// Returns at most `top_n` candidates, best first. Empty input returns
    /// empty output without a backend call. A candidate whose scoring call
    /// fails is dropped rather than aborting the pass.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<EvidenceCandidate>,
        top_n: usize,
    ) -> Vec<RerankedEvidence> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let text = rerank_text(&candidate);
            match self.cross_encoder.score(query, &text).await {
                Ok(rerank_score) => scored.push(RerankedEvidence {
                    candidate,
                    rerank_score,
                }),
                Err(e) => {
                    tracing::warn!(
                        fact_id = candidate.fact_id,
                        error = %e,
                        "rerank scoring failed — dropping candidate"
                    );
                }
            }
        }

        scored.sort_by(|a, b| {
            b.rerank_score
                .total_cmp(&a.rerank_score)
                .then(b.candidate.similarity_score.total_cmp(&a.candidate.similarity_score))
        });
        scored.truncate(top_n);
        scored
    }
}

/// Candidate text for the cross-encoder: first non-empty field in preference
/// order, truncated. Never an empty string when any field has content.
fn rerank_text(candidate: &EvidenceCandidate) -> String {
    let text = candidate.text();
    text.chars().take(MAX_RERANK_CHARS).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeCrossEncoder;

    fn candidate(fact_id: i64, summary: &str, similarity: f32, rank: usize) -> EvidenceCandidate {
        EvidenceCandidate {
            fact_id,
            summary: summary.to_string(),
            full_text: None,
            similarity_score: similarity,
            rank_position: rank,
        }
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty_without_backend_call() {
        let reranker = Reranker::new(Arc::new(FakeCrossEncoder::panicking()));
        let out = reranker.rerank("query", Vec::new(), 3).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_orders_by_rerank_score_descending() {
        let ce = FakeCrossEncoder::default()
            .with_score("low relevance", 0.2)
            .with_score("high relevance", 4.5)
            .with_score("mid relevance", 1.1);
        let reranker = Reranker::new(Arc::new(ce));

        let out = reranker
            .rerank(
                "q",
                vec![
                    candidate(1, "low relevance", 0.9, 0),
                    candidate(2, "high relevance", 0.1, 1),
                    candidate(3, "mid relevance", 0.5, 2),
                ],
                3,
            )
            .await;

        let ids: Vec<i64> = out.iter().map(|r| r.candidate.fact_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_never_returns_more_than_top_n() {
        let ce = FakeCrossEncoder::default().with_default_score(1.0);
        let reranker = Reranker::new(Arc::new(ce));

        let candidates = (0..5)
            .map(|i| candidate(i, "same text", 0.5, i as usize))
            .collect();
        let out = reranker.rerank("q", candidates, 3).await;
        assert_eq!(out.len(), 3);
    }

    #[tokio::test]
    async fn test_equal_rerank_scores_tie_break_on_similarity() {
        let ce = FakeCrossEncoder::default().with_default_score(2.0);
        let reranker = Reranker::new(Arc::new(ce));

        let out = reranker
            .rerank(
                "q",
                vec![
                    candidate(1, "a", 0.3, 0),
                    candidate(2, "b", 0.8, 1),
                    candidate(3, "c", 0.5, 2),
                ],
                3,
            )
            .await;

        let ids: Vec<i64> = out.iter().map(|r| r.candidate.fact_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_full_ties_keep_input_order() {
        let ce = FakeCrossEncoder::default().with_default_score(2.0);
        let reranker = Reranker::new(Arc::new(ce));

        let out = reranker
            .rerank(
                "q",
                vec![
                    candidate(7, "a", 0.4, 0),
                    candidate(8, "b", 0.4, 1),
                    candidate(9, "c", 0.4, 2),
                ],
                3,
            )
            .await;

        let ids: Vec<i64> = out.iter().map(|r| r.candidate.fact_id).collect();
        assert_eq!(ids, vec![7, 8, 9], "stable sort must preserve tie order");
    }

    #[tokio::test]
    async fn test_falls_back_to_full_text_when_summary_empty() {
        let ce = FakeCrossEncoder::default().with_score("body text", 3.0);
        let reranker = Reranker::new(Arc::new(ce));

        let mut c = candidate(1, "", 0.5, 0);
        c.full_text = Some("body text".to_string());

        let out = reranker.rerank("q", vec![c], 1).await;
        assert_eq!(out.len(), 1);
        assert!((out[0].rerank_score - 3.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_failing_candidate_is_dropped_not_fatal() {
        let ce = FakeCrossEncoder::default()
            .with_score("good", 1.0)
            .with_failure("bad");
        let reranker = Reranker::new(Arc::new(ce));

        let out = reranker
            .rerank(
                "q",
                vec![candidate(1, "good", 0.5, 0), candidate(2, "bad", 0.6, 1)],
                3,
            )
            .await;

        let ids: Vec<i64> = out.iter().map(|r| r.candidate.fact_id).collect();
        assert_eq!(ids, vec![1]);
    }
}
