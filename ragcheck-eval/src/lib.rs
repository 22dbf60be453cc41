//! # ragcheck-eval: grounded-output verification
//!
//! Checks a generated answer against the retrieved passages it should be
//! grounded in:
//! 1. **Grounding**: retrieved passages are deduplicated into one document
//! 2. **Claims**: the answer is split into atomic claims
//! 3. **Judges**: a narrow entailment classifier and a general
//!    contradiction judge each rule on every claim
//! 4. **Omissions**: relevant grounding facts missing from the answer
//! 5. **Scoring**: two F1 scores, one per judge
//!
//! Every model call and stage result goes to the audit log.

pub mod error;
pub mod eval;
pub mod rag;

// Re-exports
pub use error::{EvalError, ParseError, RetrievalError};
pub use eval::{ValidationReport, Verifier};
pub use rag::{GroundingDocument, GroundingPassage, InMemoryRetriever, PassageFilter, Retriever};
