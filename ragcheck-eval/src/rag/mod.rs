//! Grounding side of the pipeline: passages, retrieval, and assembly.

pub mod grounding;
pub mod retriever;

pub use grounding::{GroundingDocument, GroundingPassage, assemble};
pub use retriever::{InMemoryRetriever, PassageFilter, RetrievalQuery, Retriever};
