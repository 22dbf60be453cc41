//! Error types for the ragcheck core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! for LLM transport, configuration, and the audit log.

use std::path::PathBuf;

/// Errors from LLM provider interactions.
///
/// Every variant is terminal for the caller: nothing in the verification
/// pipeline retries a failed model call.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },

    #[error("Unknown provider: {provider}")]
    UnknownProvider { provider: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from the audit log sink.
///
/// These are the only errors the verifier swallows: a failed append is
/// reported through `tracing` and execution continues.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Failed to write audit record: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Audit sink unavailable: {message}")]
    Unavailable { message: String },
}
