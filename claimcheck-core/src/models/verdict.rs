use serde::{Deserialize, Serialize};

use super::Stance;

/// Terminal label of one verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    True,
    Fake,
    Unverified,
    Misleading,
    /// Retrieval-based evidence was missing, off-topic, or unconvincing;
    /// the caller should route the claim to the standalone classifier.
    UseMlModel,
}

/// The pipeline's terminal output. Never mutated after construction.
///
/// `confidence` is 0-100 but its meaning is branch-dependent: mean similarity
/// × 100 on the weak-evidence gate, best entailment confidence on the
/// weak-classification gate, and best combined confidence on majority votes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalVerdict {
    pub label: Verdict,
    pub confidence: f32,
    /// Fact id of the highest combined-confidence evidence item, when any.
    pub best_evidence_ref: Option<i64>,
}

/// One evidence entry of a verification response, shaped for display by the
/// calling layer (which owns any translation back to the user's language).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceReport {
    pub fact_id: i64,
    pub stance: Stance,
    pub stance_confidence: f32,
    pub best_sentence: String,
    pub rerank_score: f32,
    pub similarity_score: f32,
}

/// Everything `verify` hands back to the calling layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verdict: FinalVerdict,
    pub evidence: Vec<EvidenceReport>,
}
