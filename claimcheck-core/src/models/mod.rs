pub mod evidence;
pub mod fact;
pub mod verdict;

pub use evidence::{EvidenceCandidate, RerankedEvidence, Stance, StanceVerdict};
pub use fact::FactRecord;
pub use verdict::{EvidenceReport, FinalVerdict, Verdict, VerifyResponse};
