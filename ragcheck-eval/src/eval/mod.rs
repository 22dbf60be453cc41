//! Verification engine: claims, judges, omissions, and scoring.

pub mod claims;
pub mod contradiction;
pub mod entailment;
pub mod metrics;
pub mod omission;
pub mod parser;
pub mod prompts;
pub mod report;
pub mod trail;
pub mod verifier;

pub use claims::{Decomposition, DecompositionMode, decompose};
pub use contradiction::{ContradictionCounts, ContradictionJudge, Verdict, VerdictLabel};
pub use entailment::{EntailmentCounts, EntailmentJudge, EntailmentOutcome};
pub use metrics::{Confusion, Judgments, ScoringStrategy};
pub use omission::{Importance, MissedFact, OmissionDetector, OmissionOutcome};
pub use parser::{decode, parse_response, strip_fence};
pub use report::{StageTimings, ValidationReport};
pub use trail::AuditTrail;
pub use verifier::Verifier;
