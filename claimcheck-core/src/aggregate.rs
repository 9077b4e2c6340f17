//! Verdict aggregator — combines per-evidence stance outcomes into one verdict
//!
//! An ordered list of fallback gates runs first; the earliest match wins.
//! Each gate guards a distinct failure mode (no evidence, topically weak
//! evidence, weak best classification) and routes the claim to the
//! standalone classifier via `Verdict::UseMlModel`. Only when every gate
//! passes does the majority vote over stance labels produce a
//! retrieval-based verdict.
//!
//! The confidence scale is branch-dependent (mean similarity × 100, best
//! entailment confidence, or best combined confidence); the calling UI's
//! confidence bar depends on exactly this behavior.

use crate::config::VerificationConfig;
use crate::models::{FinalVerdict, Stance, StanceVerdict, Verdict};

type Gate = fn(&VerdictAggregator, &[StanceVerdict]) -> Option<FinalVerdict>;

pub struct VerdictAggregator {
    min_avg_similarity: f32,
    min_entailment_confidence: f32,
}

impl VerdictAggregator {
    pub fn new(config: &VerificationConfig) -> Self {
        Self {
            min_avg_similarity: config.min_avg_similarity,
            min_entailment_confidence: config.min_entailment_confidence,
        }
    }

    pub fn aggregate(&self, verdicts: &[StanceVerdict]) -> FinalVerdict {
        const GATES: [Gate; 3] = [
            VerdictAggregator::gate_no_evidence,
            VerdictAggregator::gate_weak_similarity,
            VerdictAggregator::gate_weak_classification,
        ];

        for gate in GATES {
            if let Some(fallback) = gate(self, verdicts) {
                tracing::info!(
                    label = ?fallback.label,
                    confidence = fallback.confidence,
                    "fallback gate fired"
                );
                return fallback;
            }
        }

        self.majority_vote(verdicts)
    }

    /// Gate 1: nothing to aggregate (empty retrieval, low-information claim,
    /// or every item's scoring failed).
    fn gate_no_evidence(&self, verdicts: &[StanceVerdict]) -> Option<FinalVerdict> {
        if verdicts.is_empty() {
            return Some(FinalVerdict {
                label: Verdict::UseMlModel,
                confidence: 0.0,
                best_evidence_ref: None,
            });
        }
        None
    }

    /// Gate 2: evidence is topically too weak to trust any stance.
    fn gate_weak_similarity(&self, verdicts: &[StanceVerdict]) -> Option<FinalVerdict> {
        let avg = avg_similarity(verdicts);
        if avg < self.min_avg_similarity {
            return Some(FinalVerdict {
                label: Verdict::UseMlModel,
                confidence: avg * 100.0,
                best_evidence_ref: None,
            });
        }
        None
    }

    /// Gate 3: even the strongest single classification is not confident.
    /// Uses raw entailment confidence, not the combined score.
    fn gate_weak_classification(&self, verdicts: &[StanceVerdict]) -> Option<FinalVerdict> {
        let best = verdicts
            .iter()
            .map(|v| v.stance_confidence)
            .fold(0.0_f32, f32::max);
        if best < self.min_entailment_confidence {
            return Some(FinalVerdict {
                label: Verdict::UseMlModel,
                confidence: best,
                best_evidence_ref: None,
            });
        }
        None
    }

    fn majority_vote(&self, verdicts: &[StanceVerdict]) -> FinalVerdict {
        let contradict = count_stance(verdicts, Stance::Contradict);
        let support = count_stance(verdicts, Stance::Support);

        let label = if contradict > support {
            Verdict::Fake
        } else if support > contradict {
            Verdict::True
        } else if contradict > 0 {
            // equal and nonzero
            Verdict::Misleading
        } else {
            Verdict::Unverified
        };

        let best = verdicts
            .iter()
            .max_by(|a, b| a.combined_confidence().total_cmp(&b.combined_confidence()));

        FinalVerdict {
            label,
            confidence: best.map(|v| v.combined_confidence()).unwrap_or(0.0),
            best_evidence_ref: best.map(|v| v.fact_id),
        }
    }
}

fn avg_similarity(verdicts: &[StanceVerdict]) -> f32 {
    if verdicts.is_empty() {
        return 0.0;
    }
    verdicts.iter().map(|v| v.semantic_similarity).sum::<f32>() / verdicts.len() as f32
}

fn count_stance(verdicts: &[StanceVerdict], stance: Stance) -> usize {
    verdicts.iter().filter(|v| v.stance == stance).count()
}

// ============================================================================
// TESTS
// ============================================================================
