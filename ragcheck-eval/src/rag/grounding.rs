//! Grounding assembly: flatten retrieved passages into one ground-truth document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A retrieved passage.
///
/// Only `id` and `text` take part in verification. Everything else a
/// retrieval backend returns (embedding vectors, duplicated raw text,
/// location metadata) is kept in `metadata` so payloads round-trip, and is
/// never copied into the grounding document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingPassage {
    pub id: String,
    pub text: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl GroundingPassage {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: Map::new(),
        }
    }

    /// Attach a metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The deduplicated, concatenated text the judges treat as ground truth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingDocument {
    pub text: String,
    /// Ids of the passages that contributed text, in order.
    pub passage_ids: Vec<String>,
}

impl GroundingDocument {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

impl From<&str> for GroundingDocument {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
            passage_ids: Vec::new(),
        }
    }
}

impl From<String> for GroundingDocument {
    fn from(text: String) -> Self {
        Self {
            text,
            passage_ids: Vec::new(),
        }
    }
}

/// Assemble passages into a grounding document.
///
/// Passages are taken in arrival order; a passage whose id was already seen
/// is skipped. Each kept passage contributes its text followed by `\n`.
pub fn assemble(passages: &[GroundingPassage]) -> GroundingDocument {
    let mut seen: HashSet<&str> = HashSet::with_capacity(passages.len());
    let mut doc = GroundingDocument::default();
    for passage in passages {
        if !seen.insert(passage.id.as_str()) {
            continue;
        }
        doc.text.push_str(&passage.text);
        doc.text.push('\n');
        doc.passage_ids.push(passage.id.clone());
    }
    doc
}
