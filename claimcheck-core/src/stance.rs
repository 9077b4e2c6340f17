//! Stance scorer — sentence-level entailment between a claim and evidence
//!
//! For each evidence item, finds the sentence most diagnostic of the claim's
//! truth value: every sentence gets a claim/sentence cosine similarity and a
//! 3-way entailment distribution, and the sentence with the best
//! similarity-damped entailment confidence wins.

use futures::stream::{self, StreamExt};
use regex::Regex;
use std::sync::Arc;
use std::sync::OnceLock;

use crate::models::{RerankedEvidence, Stance, StanceVerdict};
use crate::scoring::{EmbeddingBackend, EntailmentBackend, ScoringError};

/// Tokens that carry no checkable content on their own.
const STOP_SET: &[&str] = &[
    "this", "that", "it", "is", "was", "true", "false", "real", "fake", "correct",
];

/// Leading tokens marking a short interrogative.
const QUESTION_WORDS: &[&str] = &[
    "what", "why", "how", "is", "are", "was", "were", "did", "does", "do", "who", "when", "where",
    "which", "can", "could", "will", "would",
];

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Collapse line breaks and runs of whitespace; trim.
pub fn normalize_claim(text: &str) -> String {
    let text = text.replace(['\r', '\n'], " ");
    whitespace_re().replace_all(text.trim(), " ").into_owned()
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// A claim too vague to take a stance on: too few tokens, nothing but
/// stop-set filler, or a short question. The scorer refuses these and the
/// fallback path takes over.
pub fn is_low_information_claim(claim: &str) -> bool {
    let tokens = tokenize(&normalize_claim(claim));

    if tokens.len() < 3 {
        return true;
    }
    if tokens.iter().all(|t| STOP_SET.contains(&t.as_str())) {
        return true;
    }
    if QUESTION_WORDS.contains(&tokens[0].as_str()) && tokens.len() < 4 {
        return true;
    }
    false
}

/// Sentence boundaries on `.`/`!`/`?` followed by whitespace or end of text.
/// Sentences without any alphanumeric content are discarded.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |next| next.is_whitespace());
            if at_boundary {
                push_sentence(&mut sentences, &mut current);
            }
        }
    }
    push_sentence(&mut sentences, &mut current);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if trimmed.chars().any(char::is_alphanumeric) {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

pub struct StanceScorer {
    embedder: Arc<dyn EmbeddingBackend>,
    entailment: Arc<dyn EntailmentBackend>,
}

impl StanceScorer {
    pub fn new(embedder: Arc<dyn EmbeddingBackend>, entailment: Arc<dyn EntailmentBackend>) -> Self {
        Self {
            embedder,
            entailment,
        }
    }

    /// Stance verdicts for every evidence item. Low-information claims yield
    /// an empty list (the fallback routing signal). Items whose scoring
    /// fails are dropped; the remainder still aggregate. All items are
    /// scored to completion before this returns — aggregation never starts
    /// on partial results.
    pub async fn score_evidence(
        &self,
        claim: &str,
        evidence: &[RerankedEvidence],
    ) -> Vec<StanceVerdict> {
        if is_low_information_claim(claim) {
            tracing::info!("low-information claim — refusing stance scoring");
            return Vec::new();
        }
        if evidence.is_empty() {
            return Vec::new();
        }

        let claim_embedding = match self.embedder.embed(claim).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "claim embedding failed — no stance results");
                return Vec::new();
            }
        };

        let workers = num_cpus::get().min(evidence.len());
        let outcomes: Vec<Result<StanceVerdict, ScoringError>> =
            stream::iter(evidence.iter().map(|item| {
                let claim_embedding = &claim_embedding;
                async move {
                    self.score_item(claim, claim_embedding, item.candidate.fact_id, item.candidate.text())
                        .await
                }
            }))
            .buffer_unordered(workers.max(1))
            .collect()
            .await;

        let mut verdicts = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(v) => {
                    tracing::debug!(
                        fact_id = v.fact_id,
                        stance = ?v.stance,
                        confidence = v.stance_confidence,
                        "stance scored"
                    );
                    verdicts.push(v);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stance scoring failed — dropping evidence item");
                }
            }
        }
        verdicts
    }

    /// Score one evidence text: pick the sentence maximizing
    /// `similarity × max(entailment) × 100` and take its argmax label.
    async fn score_item(
        &self,
        claim: &str,
        claim_embedding: &[f32],
        fact_id: i64,
        text: &str,
    ) -> Result<StanceVerdict, ScoringError> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Ok(StanceVerdict::empty(fact_id));
        }

        let mut best: Option<StanceVerdict> = None;

        for sentence in sentences {
            let sentence_embedding = self.embedder.embed(&sentence).await?;
            let similarity =
                cosine_similarity(claim_embedding, &sentence_embedding).clamp(0.0, 1.0);

            let probs = self.entailment.entail(claim, &sentence).await?;
            let (label_id, max_prob) = probs
                .iter()
                .copied()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or((1, 0.0));

            let verdict = StanceVerdict {
                fact_id,
                best_sentence: sentence,
                stance: Stance::from_label_id(label_id),
                stance_confidence: max_prob * 100.0,
                semantic_similarity: similarity,
            };

            let is_better = best
                .as_ref()
                .map_or(true, |b| verdict.combined_confidence() > b.combined_confidence());
            if is_better {
                best = Some(verdict);
            }
        }

        // sentences is non-empty, so best is always set
        Ok(best.unwrap_or_else(|| StanceVerdict::empty(fact_id)))
    }
}

// ============================================================================
// TESTS
// ============================================================================
