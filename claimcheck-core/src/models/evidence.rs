use serde::{Deserialize, Serialize};

/// One retrieval hit. `similarity_score` is cosine similarity against the
/// query embedding (`1 - cosine_distance`), higher-is-closer — the same
/// convention everywhere downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceCandidate {
    pub fact_id: i64,
    pub summary: String,
    pub full_text: Option<String>,
    pub similarity_score: f32,
    pub rank_position: usize,
}

impl EvidenceCandidate {
    /// Scoring text in field-preference order: summary, then full text.
    /// Empty only when every field is empty.
    pub fn text(&self) -> &str {
        if !self.summary.trim().is_empty() {
            return &self.summary;
        }
        self.full_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("")
    }
}

/// A candidate that survived the cross-encoder pass.
/// `rerank_score` is the raw relevance logit, higher-is-better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankedEvidence {
    #[serde(flatten)]
    pub candidate: EvidenceCandidate,
    pub rerank_score: f32,
}

/// Relationship between a claim and one evidence sentence, as judged by the
/// entailment model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Contradict,
    Neutral,
    Support,
}

impl Stance {
    /// Maps an index into the NLI output distribution to its label.
    /// Order matches the model head: [contradict, neutral, support].
    pub fn from_label_id(id: usize) -> Self {
        match id {
            0 => Stance::Contradict,
            2 => Stance::Support,
            _ => Stance::Neutral,
        }
    }
}

/// Per-evidence stance outcome. Correlates with its `RerankedEvidence` by
/// `fact_id`, never by array position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StanceVerdict {
    pub fact_id: i64,
    pub best_sentence: String,
    pub stance: Stance,
    /// Max entailment probability of the best sentence, scaled to 0-100.
    pub stance_confidence: f32,
    /// Cosine similarity between claim and best sentence, clamped to [0, 1].
    pub semantic_similarity: f32,
}

impl StanceVerdict {
    /// Placeholder for evidence with no extractable sentences.
    pub fn empty(fact_id: i64) -> Self {
        Self {
            fact_id,
            best_sentence: String::new(),
            stance: Stance::Neutral,
            stance_confidence: 0.0,
            semantic_similarity: 0.0,
        }
    }

    /// Similarity-damped stance confidence, 0-100. Topical similarity
    /// suppresses confident entailment on off-topic sentences.
    pub fn combined_confidence(&self) -> f32 {
        self.semantic_similarity * self.stance_confidence
    }
}
