//! Fallback classifier — claim-only factuality when retrieval is inconclusive
//!
//! The pipeline's contract ends at emitting `Verdict::UseMlModel`; the
//! *calling layer* decides to invoke this classifier. It sees the claim
//! alone, never the retrieved evidence.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ClaimcheckError;
use crate::models::Verdict;
use crate::scoring::ClaimClassifier;

/// Verdict from the claim-only classifier. `probs` keeps the full
/// distribution for the display layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackVerdict {
    pub label: Verdict,
    pub confidence: f32,
    pub probs: FallbackProbs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackProbs {
    pub contradiction: f32,
    pub neutral: f32,
    pub entailment: f32,
}

pub struct FallbackClassifier {
    classifier: Arc<dyn ClaimClassifier>,
    threshold: f32,
}

impl FallbackClassifier {
    pub fn new(classifier: Arc<dyn ClaimClassifier>, threshold: f32) -> Self {
        Self {
            classifier,
            threshold,
        }
    }

    /// FEVER-style decision: a winner needs to clear the threshold outright,
    /// otherwise the claim stays `Unverified` at the strongest probability.
    pub async fn predict(&self, claim_en: &str) -> Result<FallbackVerdict, ClaimcheckError> {
        let [contradiction, neutral, entailment] = self.classifier.classify(claim_en).await?;

        let probs = FallbackProbs {
            contradiction,
            neutral,
            entailment,
        };

        let (label, confidence) = if contradiction >= self.threshold {
            (Verdict::Fake, contradiction)
        } else if entailment >= self.threshold {
            (Verdict::True, entailment)
        } else {
            let max = contradiction.max(neutral).max(entailment);
            (Verdict::Unverified, max)
        };

        tracing::info!(label = ?label, confidence = confidence * 100.0, "fallback classified");

        Ok(FallbackVerdict {
            label,
            confidence: confidence * 100.0,
            probs,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
