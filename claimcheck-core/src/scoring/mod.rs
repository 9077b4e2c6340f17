//! Scoring backends for claim verification — black-box model functions
//!
//! The pipeline never sees model internals, only these traits:
//! - [`EmbeddingBackend`] — text → vector (bi-encoder), used by the retriever
//!   and for claim/sentence similarity
//! - [`CrossEncoderBackend`] — (query, document) → relevance score, used by
//!   the reranker
//! - [`EntailmentBackend`] — (claim, sentence) → 3-way stance distribution
//! - [`ClaimClassifier`] — claim → 3-way factuality distribution, consumed by
//!   the caller-side fallback only
//!
//! Implementations are expensive to construct; build them once at process
//! start and share them behind `Arc` — they are safe for concurrent inference.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ModelsConfig;

pub mod onnx;
pub mod remote;

pub use onnx::{OnnxClaimClassifier, OnnxCrossEncoder, OnnxEmbedder, OnnxEntailmentModel};
pub use remote::{RemoteEmbeddingClient, RemoteEmbeddingConfig};

// ============================================================================
// Backend traits
// ============================================================================

/// Abstraction over embedding providers.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ScoringError>;

    /// Embed a search query. Backends that distinguish query and document
    /// encodings can override this; defaults to `embed()`.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        self.embed(text).await
    }

    /// Returns the embedding dimension (e.g., 384).
    fn dimensions(&self) -> usize;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Fine-grained query-document relevance scoring. Each pair is scored
/// independently; there is no cross-candidate interaction.
#[async_trait]
pub trait CrossEncoderBackend: Send + Sync {
    /// Raw relevance logit, higher-is-better.
    async fn score(&self, query: &str, document: &str) -> Result<f32, ScoringError>;

    fn name(&self) -> &str;
}

/// 3-way natural-language-inference scoring for a (claim, sentence) pair.
#[async_trait]
pub trait EntailmentBackend: Send + Sync {
    /// Probability distribution over [contradict, neutral, support];
    /// sums to 1 within floating-point tolerance.
    async fn entail(&self, claim: &str, sentence: &str) -> Result<[f32; 3], ScoringError>;

    fn name(&self) -> &str;
}

/// Claim-only factuality classifier backing the fallback path.
#[async_trait]
pub trait ClaimClassifier: Send + Sync {
    /// Probability distribution over [contradiction, neutral, entailment].
    async fn classify(&self, claim: &str) -> Result<[f32; 3], ScoringError>;

    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

/// Scoring backend errors
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Invalid response: expected {expected} dimensions, got {actual}")]
    InvalidDimensions { expected: usize, actual: usize },

    #[error("Missing embedding in response")]
    MissingEmbedding,

    #[error("All {attempts} retry attempts failed")]
    RetryExhausted { attempts: usize },

    #[error("ONNX model not found at {path}")]
    ModelNotFound { path: String },

    #[error("ONNX inference error: {0}")]
    OnnxInference(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
}

// ============================================================================
// Backend factory
// ============================================================================

/// Create the embedding backend selected by `[models] embedding_backend`.
pub fn create_embedding_backend(
    config: &ModelsConfig,
) -> Result<Box<dyn EmbeddingBackend>, ScoringError> {
    match config.embedding_backend.as_str() {
        "remote" => {
            let client = RemoteEmbeddingClient::new(RemoteEmbeddingConfig {
                base_url: config.remote_embedding_url.clone(),
                dimensions: config.embedder_dimensions as usize,
                max_retries: 3,
                retry_delay_ms: 1000,
            })?;
            Ok(Box::new(client))
        }
        _ => {
            // Default: "onnx"
            let embedder = OnnxEmbedder::from_model_path(
                &config.embedder_path,
                config.embedder_dimensions as usize,
            )?;
            Ok(Box::new(embedder))
        }
    }
}
