use thiserror::Error;

use crate::scoring::ScoringError;

#[derive(Error, Debug)]
pub enum ClaimcheckError {
    /// Fact corpus or its vector index failed to load. Fatal at startup —
    /// the service must not serve without a corpus.
    #[error("Fact corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// The embedding or search backend failed during a request. Callers
    /// degrade to an empty evidence list instead of propagating a crash.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// A scoring backend failed for one evidence item. The item is dropped
    /// from aggregation; the verification continues.
    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
