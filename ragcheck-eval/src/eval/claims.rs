//! Claim decomposition: split a generated answer into atomic claims.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

/// How the claim list was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionMode {
    /// The caller supplied a JSON array of claims.
    PreDecomposed,
    /// The answer was split on Unicode sentence boundaries.
    Segmented,
}

impl std::fmt::Display for DecompositionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecompositionMode::PreDecomposed => write!(f, "pre_decomposed"),
            DecompositionMode::Segmented => write!(f, "segmented"),
        }
    }
}

/// Claims extracted from one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    pub mode: DecompositionMode,
    pub claims: Vec<String>,
}

impl Decomposition {
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

/// Decompose a generated answer into claims.
///
/// An answer whose trimmed text is a JSON array is taken as already
/// decomposed: each element is one claim (strings by value, anything else
/// as compact JSON). Otherwise the answer is split into sentences and
/// whitespace-only segments are dropped. Segments are kept verbatim.
pub fn decompose(output: &str) -> Decomposition {
    if let Ok(items) = serde_json::from_str::<Vec<Value>>(output.trim()) {
        let claims = items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
        return Decomposition {
            mode: DecompositionMode::PreDecomposed,
            claims,
        };
    }

    Decomposition {
        mode: DecompositionMode::Segmented,
        claims: segment_sentences(output),
    }
}

/// Split text on Unicode sentence boundaries, dropping blank segments.
pub fn segment_sentences(text: &str) -> Vec<String> {
    text.split_sentence_bounds()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .collect()
}
