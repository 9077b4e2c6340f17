pub mod aggregate;
pub mod config;
pub mod error;
pub mod fallback;
pub mod models;
pub mod pipeline;
pub mod rerank;
pub mod retrieve;
pub mod scoring;
pub mod stance;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use aggregate::VerdictAggregator;
pub use config::ClaimcheckConfig;
pub use error::ClaimcheckError;
pub use fallback::{FallbackClassifier, FallbackVerdict};
pub use models::{
    EvidenceCandidate, EvidenceReport, FactRecord, FinalVerdict, RerankedEvidence, Stance,
    StanceVerdict, Verdict, VerifyResponse,
};
pub use pipeline::VerifyPipeline;
pub use rerank::Reranker;
pub use retrieve::{EvidenceRetriever, Retriever};
pub use stance::StanceScorer;
pub use store::FactStore;
