//! Retrieval collaborator: the source of grounding passages.
//!
//! The verifier only reads from a retriever. The vector store behind a real
//! deployment lives outside this crate; `InMemoryRetriever` serves passages
//! loaded from a JSONL export.

use crate::error::RetrievalError;
use crate::rag::grounding::GroundingPassage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;

/// Equality filter on one passage field: `key=value`.
///
/// The key `id` matches the passage id; any other key matches a metadata
/// field. String fields compare by value, other JSON values by their
/// compact JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageFilter {
    pub key: String,
    pub value: String,
}

impl PassageFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, passage: &GroundingPassage) -> bool {
        if self.key == "id" {
            return passage.id == self.value;
        }
        match passage.metadata.get(&self.key) {
            Some(Value::String(s)) => *s == self.value,
            Some(other) => other.to_string() == self.value,
            None => false,
        }
    }
}

impl FromStr for PassageFilter {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RetrievalError::InvalidFilter {
            filter: s.to_string(),
        };
        let (key, value) = s.split_once('=').ok_or_else(invalid)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(key, value.trim()))
    }
}

impl std::fmt::Display for PassageFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// A retrieval request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub filter: Option<PassageFilter>,
    pub limit: usize,
}

impl RetrievalQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            filter: None,
            limit,
        }
    }

    pub fn with_filter(mut self, filter: PassageFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Source of grounding passages.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `limit` passages matching `filter`, in retrieval order.
    async fn query(
        &self,
        filter: Option<&PassageFilter>,
        limit: usize,
    ) -> Result<Vec<GroundingPassage>, RetrievalError>;
}

/// Retriever over an in-memory passage list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRetriever {
    passages: Vec<GroundingPassage>,
}

impl InMemoryRetriever {
    pub fn new(passages: Vec<GroundingPassage>) -> Self {
        Self { passages }
    }

    /// Parse one passage per non-blank line.
    pub fn from_jsonl_str(content: &str) -> Result<Self, RetrievalError> {
        let mut passages = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let passage =
                serde_json::from_str(line).map_err(|source| RetrievalError::Malformed {
                    line: idx + 1,
                    source,
                })?;
            passages.push(passage);
        }
        Ok(Self { passages })
    }

    /// Load passages from a JSONL file.
    pub fn from_jsonl(path: &Path) -> Result<Self, RetrievalError> {
        let content = std::fs::read_to_string(path).map_err(|source| RetrievalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_jsonl_str(&content)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn query(
        &self,
        filter: Option<&PassageFilter>,
        limit: usize,
    ) -> Result<Vec<GroundingPassage>, RetrievalError> {
        Ok(self
            .passages
            .iter()
            .filter(|p| filter.is_none_or(|f| f.matches(p)))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn corpus() -> InMemoryRetriever {
        InMemoryRetriever::new(vec![
            GroundingPassage::new("1", "Paris is the capital of France.")
                .with_metadata("source", "atlas"),
            GroundingPassage::new("2", "The Seine flows through Paris.")
                .with_metadata("source", "rivers")
                .with_metadata("page", 12),
            GroundingPassage::new("3", "France borders Spain.").with_metadata("source", "atlas"),
        ])
    }

    #[test]
    fn test_filter_parse() {
        let filter: PassageFilter = "source = atlas".parse().unwrap();
        assert_eq!(filter, PassageFilter::new("source", "atlas"));
        assert_eq!(filter.to_string(), "source=atlas");
        assert!("no-equals".parse::<PassageFilter>().is_err());
        assert!("=value".parse::<PassageFilter>().is_err());
    }

    #[tokio::test]
    async fn test_query_with_filter_and_limit() {
        let retriever = corpus();
        let filter = PassageFilter::new("source", "atlas");
        let hits = retriever.query(Some(&filter), 10).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let hits = retriever.query(None, 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_query_matches_non_string_metadata_and_id() {
        let retriever = corpus();
        let hits = retriever
            .query(Some(&PassageFilter::new("page", "12")), 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");

        let hits = retriever
            .query(Some(&PassageFilter::new("id", "3")), 10)
            .await
            .unwrap();
        assert_eq!(hits[0].text, "France borders Spain.");
    }

    #[test]
    fn test_from_jsonl_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id":"a","text":"one","source":"x"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"id":"b","text":"two"}}"#).unwrap();

        let retriever = InMemoryRetriever::from_jsonl(file.path()).unwrap();
        assert_eq!(retriever.len(), 2);
    }

    #[test]
    fn test_from_jsonl_reports_line() {
        let err = InMemoryRetriever::from_jsonl_str("{\"id\":\"a\",\"text\":\"ok\"}\nnot json\n")
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_from_jsonl_missing_file() {
        let err = InMemoryRetriever::from_jsonl(Path::new("/nonexistent/passages.jsonl"))
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Io { .. }));
    }
}
