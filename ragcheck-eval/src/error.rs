//! Error types for the ragcheck-eval crate.
//!
//! Every stage failure is terminal for its validation call: there is no
//! partial-credit path from a failed stage to a report.

use ragcheck_core::audit::Stage;
use ragcheck_core::error::LlmError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of the retrieval collaborator.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Invalid passage filter '{filter}': expected key=value")]
    InvalidFilter { filter: String },

    #[error("Failed to read passages from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed passage on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Retrieval backend unavailable: {message}")]
    Unavailable { message: String },
}

/// Failure to turn a raw model reply into a typed payload.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model response is empty")]
    Empty,

    #[error("model response opens a code fence that is never closed")]
    UnterminatedFence,

    #[error("model response is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("model response does not match the expected schema: {0}")]
    Schema(#[source] serde_json::Error),
}

/// Error returned by a validation call.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("{stage} model call failed: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    #[error("{stage} response could not be parsed: {source}")]
    Parse {
        stage: Stage,
        #[source]
        source: ParseError,
    },

    #[error("{stage} task failed: {message}")]
    TaskFailed { stage: Stage, message: String },

    #[error("{stage} returned {actual} verdicts for {expected} claims")]
    Misaligned {
        stage: Stage,
        expected: usize,
        actual: usize,
    },
}

impl EvalError {
    pub fn transport(stage: Stage, source: LlmError) -> Self {
        Self::Transport { stage, source }
    }

    pub fn parse(stage: Stage, source: ParseError) -> Self {
        Self::Parse { stage, source }
    }

    /// The stage the error originated in.
    pub fn stage(&self) -> Stage {
        match self {
            EvalError::Retrieval(_) => Stage::Retrieval,
            EvalError::Transport { stage, .. }
            | EvalError::Parse { stage, .. }
            | EvalError::TaskFailed { stage, .. }
            | EvalError::Misaligned { stage, .. } => *stage,
        }
    }
}
