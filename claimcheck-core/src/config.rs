use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ClaimcheckConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Paths and dimensions of the local ONNX scoring models. Each model ships
/// with a sibling `<stem>-tokenizer.json` (see `scoring::onnx::sibling_tokenizer`).
#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    /// Embedding backend selector: "onnx" (default) or "remote".
    #[serde(default = "default_embedding_backend")]
    pub embedding_backend: String,
    /// Bi-encoder producing claim/sentence/query embeddings.
    pub embedder_path: String,
    pub embedder_dimensions: u32,
    /// Cross-encoder relevance model used by the reranker.
    pub reranker_path: String,
    /// 3-way NLI cross-encoder used by the stance scorer.
    pub entailment_path: String,
    /// Claim-only 3-way classifier used by the caller-side fallback.
    pub fallback_path: String,
    /// Base URL of the remote embedding service (only for backend = "remote").
    #[serde(default)]
    pub remote_embedding_url: String,
}

fn default_embedding_backend() -> String {
    "onnx".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct VerificationConfig {
    /// How many candidates the retriever pulls from the vector index.
    pub retrieve_top_k: u32,
    /// How many candidates survive reranking.
    pub rerank_top_n: u32,
    /// Aggregator gate: minimum mean claim/sentence similarity.
    pub min_avg_similarity: f32,
    /// Aggregator gate: minimum best per-item entailment confidence (0-100).
    pub min_entailment_confidence: f32,
    /// Fallback classifier decision threshold (0-1).
    pub fallback_threshold: f32,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            retrieve_top_k: 5,
            rerank_top_n: 3,
            min_avg_similarity: 0.18,
            min_entailment_confidence: 60.0,
            fallback_threshold: 0.60,
        }
    }
}

impl ClaimcheckConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}
