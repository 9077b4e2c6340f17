//! Deterministic fake scoring backends for tests.
//!
//! The pipeline takes its scorers by trait object precisely so tests can
//! swap in these; every fake is keyed on input text and fully deterministic.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::error::ClaimcheckError;
use crate::models::EvidenceCandidate;
use crate::retrieve::EvidenceRetriever;
use crate::scoring::{
    ClaimClassifier, CrossEncoderBackend, EmbeddingBackend, EntailmentBackend, ScoringError,
};

// ============================================================================
// FakeEmbedder
// ============================================================================

#[derive(Default)]
pub(crate) struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    failures: HashSet<String>,
    panic_on_call: bool,
}

impl FakeEmbedder {
    pub fn panicking() -> Self {
        Self {
            panic_on_call: true,
            ..Self::default()
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn with_failure(mut self, text: &str) -> Self {
        self.failures.insert(text.to_string());
        self
    }
}

#[async_trait]
impl EmbeddingBackend for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        assert!(!self.panic_on_call, "embedding backend must not be called");
        if self.failures.contains(text) {
            return Err(ScoringError::MissingEmbedding);
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0, 0.0]))
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "fake-embedder"
    }
}

// ============================================================================
// FakeCrossEncoder
// ============================================================================

#[derive(Default)]
pub(crate) struct FakeCrossEncoder {
    scores: HashMap<String, f32>,
    failures: HashSet<String>,
    default_score: Option<f32>,
    panic_on_call: bool,
}

impl FakeCrossEncoder {
    pub fn panicking() -> Self {
        Self {
            panic_on_call: true,
            ..Self::default()
        }
    }

    pub fn with_score(mut self, document: &str, score: f32) -> Self {
        self.scores.insert(document.to_string(), score);
        self
    }

    pub fn with_default_score(mut self, score: f32) -> Self {
        self.default_score = Some(score);
        self
    }

    pub fn with_failure(mut self, document: &str) -> Self {
        self.failures.insert(document.to_string());
        self
    }
}

#[async_trait]
impl CrossEncoderBackend for FakeCrossEncoder {
    async fn score(&self, _query: &str, document: &str) -> Result<f32, ScoringError> {
        assert!(!self.panic_on_call, "cross-encoder must not be called");
        if self.failures.contains(document) {
            return Err(ScoringError::OnnxInference("fake failure".to_string()));
        }
        Ok(self
            .scores
            .get(document)
            .copied()
            .or(self.default_score)
            .unwrap_or(0.0))
    }

    fn name(&self) -> &str {
        "fake-cross-encoder"
    }
}

// ============================================================================
// FakeEntailment
// ============================================================================

pub(crate) struct FakeEntailment {
    distributions: HashMap<String, [f32; 3]>,
    failures: HashSet<String>,
    default_distribution: [f32; 3],
}

impl Default for FakeEntailment {
    fn default() -> Self {
        Self {
            distributions: HashMap::new(),
            failures: HashSet::new(),
            default_distribution: [0.1, 0.8, 0.1],
        }
    }
}

impl FakeEntailment {
    pub fn with_distribution(mut self, sentence: &str, distribution: [f32; 3]) -> Self {
        self.distributions.insert(sentence.to_string(), distribution);
        self
    }

    #[allow(dead_code)]
    pub fn with_failure(mut self, sentence: &str) -> Self {
        self.failures.insert(sentence.to_string());
        self
    }
}

#[async_trait]
impl EntailmentBackend for FakeEntailment {
    async fn entail(&self, _claim: &str, sentence: &str) -> Result<[f32; 3], ScoringError> {
        if self.failures.contains(sentence) {
            return Err(ScoringError::OnnxInference("fake failure".to_string()));
        }
        Ok(self
            .distributions
            .get(sentence)
            .copied()
            .unwrap_or(self.default_distribution))
    }

    fn name(&self) -> &str {
        "fake-entailment"
    }
}

// ============================================================================
// FakeClaimClassifier
// ============================================================================

pub(crate) struct FakeClaimClassifier {
    pub distribution: [f32; 3],
}

#[async_trait]
impl ClaimClassifier for FakeClaimClassifier {
    async fn classify(&self, _claim: &str) -> Result<[f32; 3], ScoringError> {
        Ok(self.distribution)
    }

    fn name(&self) -> &str {
        "fake-claim-classifier"
    }
}

// ============================================================================
// FakeRetriever
// ============================================================================

#[derive(Default)]
pub(crate) struct FakeRetriever {
    candidates: Vec<EvidenceCandidate>,
    fail: bool,
    panic_on_call: bool,
}

impl FakeRetriever {
    pub fn panicking() -> Self {
        Self {
            panic_on_call: true,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_candidates(candidates: Vec<EvidenceCandidate>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }
}

#[async_trait]
impl EvidenceRetriever for FakeRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        k: usize,
    ) -> Result<Vec<EvidenceCandidate>, ClaimcheckError> {
        assert!(!self.panic_on_call, "retriever must not be called");
        if self.fail {
            return Err(ClaimcheckError::Retrieval("fake index outage".to_string()));
        }
        Ok(self.candidates.iter().take(k).cloned().collect())
    }
}
