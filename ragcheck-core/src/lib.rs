//! # Ragcheck Core
//!
//! Core plumbing for the ragcheck verification engine.
//! Provides the LLM interface (brain), OpenAI-compatible providers,
//! layered configuration, the audit log, and fundamental types.

pub mod audit;
pub mod brain;
pub mod config;
pub mod error;
pub mod providers;
pub mod types;

// Re-export commonly used types at the crate root.
pub use audit::{
    AuditEvent, AuditFormat, AuditRecord, AuditSink, FileAuditSink, MemoryAuditSink,
    NullAuditSink, Stage,
};
pub use brain::{LlmProvider, MockLlmProvider};
pub use config::{AlignmentPolicy, AuditConfig, LlmConfig, RetrievalConfig, VerifierConfig};
pub use error::{AuditError, ConfigError, LlmError};
pub use providers::create_provider;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, TokenUsage};
