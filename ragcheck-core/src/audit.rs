//! Audit log: append-only record of every verification run.
//!
//! Each validation call writes a sequence of [`AuditRecord`]s: the run
//! start, every prompt/response pair sent to a model, per-stage timings,
//! and the final report or failure. Records go to an injected
//! [`AuditSink`]; sinks never participate in control flow, so a failed
//! append is the caller's to report and ignore.

use crate::error::AuditError;
use crate::types::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// A stage of a validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Retrieval,
    Decomposition,
    Entailment,
    Contradiction,
    Omission,
    Aggregation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Retrieval => "retrieval",
            Stage::Decomposition => "decomposition",
            Stage::Entailment => "entailment",
            Stage::Contradiction => "contradiction",
            Stage::Omission => "omission",
            Stage::Aggregation => "aggregation",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// AuditRecord + AuditEvent
// ---------------------------------------------------------------------------

/// A single audit-log line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// The validation call this record belongs to.
    pub validation_id: Uuid,
    /// Wall-clock time at which the record was created.
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

impl AuditRecord {
    pub fn new(validation_id: Uuid, event: AuditEvent) -> Self {
        Self {
            validation_id,
            timestamp: Utc::now(),
            event,
        }
    }

    /// Render as a single human-readable line.
    pub fn to_text(&self) -> String {
        format!(
            "{} [{}] {} {}",
            self.timestamp.to_rfc3339(),
            self.validation_id,
            self.event.type_tag(),
            self.event.summary()
        )
    }
}

/// Discriminated union of everything a validation call records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    ValidationStarted {
        prompt: String,
        output: String,
        grounding_chars: usize,
    },
    ClaimsDecomposed {
        mode: String,
        claims: Vec<String>,
    },
    ModelCall {
        stage: Stage,
        model: String,
        prompt: Vec<Message>,
        response: String,
        duration_ms: u64,
    },
    StageCompleted {
        stage: Stage,
        duration_ms: u64,
        detail: serde_json::Value,
    },
    ValidationCompleted {
        report: serde_json::Value,
    },
    ValidationFailed {
        stage: Option<Stage>,
        error: String,
    },
}

impl AuditEvent {
    /// Return the event type as a tag (e.g. `"model_call"`).
    pub fn type_tag(&self) -> &'static str {
        match self {
            AuditEvent::ValidationStarted { .. } => "validation_started",
            AuditEvent::ClaimsDecomposed { .. } => "claims_decomposed",
            AuditEvent::ModelCall { .. } => "model_call",
            AuditEvent::StageCompleted { .. } => "stage_completed",
            AuditEvent::ValidationCompleted { .. } => "validation_completed",
            AuditEvent::ValidationFailed { .. } => "validation_failed",
        }
    }

    /// The stage this event refers to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AuditEvent::ModelCall { stage, .. } | AuditEvent::StageCompleted { stage, .. } => {
                Some(*stage)
            }
            AuditEvent::ValidationFailed { stage, .. } => *stage,
            _ => None,
        }
    }

    /// Produce a short, single-line summary of the event.
    pub fn summary(&self) -> String {
        match self {
            AuditEvent::ValidationStarted {
                prompt,
                grounding_chars,
                ..
            } => format!(
                "prompt={:?} grounding_chars={}",
                preview(prompt, 80),
                grounding_chars
            ),
            AuditEvent::ClaimsDecomposed { mode, claims } => {
                format!("{} claims ({})", claims.len(), mode)
            }
            AuditEvent::ModelCall {
                stage,
                model,
                response,
                duration_ms,
                ..
            } => format!(
                "{} via {} ({}ms): {:?}",
                stage,
                model,
                duration_ms,
                preview(response, 80)
            ),
            AuditEvent::StageCompleted {
                stage,
                duration_ms,
                detail,
            } => format!("{} finished in {}ms {}", stage, duration_ms, detail),
            AuditEvent::ValidationCompleted { report } => {
                format!(
                    "f1_classifier={} f1_judge={}",
                    report.get("f1_classifier").unwrap_or(&serde_json::Value::Null),
                    report.get("f1_judge").unwrap_or(&serde_json::Value::Null)
                )
            }
            AuditEvent::ValidationFailed { stage, error } => match stage {
                Some(stage) => format!("{} failed: {}", stage, error),
                None => format!("failed: {}", error),
            },
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Destination for audit records.
///
/// Implementations must write each record with a single append so that
/// concurrent writers interleave at record granularity.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// On-disk line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditFormat {
    /// One JSON object per line.
    #[default]
    Jsonl,
    /// One human-readable summary per line.
    Text,
}

/// Appends records to a file opened in append mode.
pub struct FileAuditSink {
    path: PathBuf,
    file: File,
    format: AuditFormat,
}

impl FileAuditSink {
    /// Open (or create) the log file, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>, format: AuditFormat) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = match self.format {
            AuditFormat::Jsonl => serde_json::to_string(record)?,
            AuditFormat::Text => record.to_text(),
        };
        line.push('\n');
        // `&File` implements `Write`; O_APPEND makes each write land at the end.
        (&self.file).write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Keeps records in memory. Used by tests and dry runs.
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records appended so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Records whose event carries the given type tag.
    pub fn records_of(&self, type_tag: &str) -> Vec<AuditRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.event.type_tag() == type_tag)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .map_err(|_| AuditError::Unavailable {
                message: "memory sink lock poisoned".to_string(),
            })?
            .push(record.clone());
        Ok(())
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn append(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Read a JSONL audit log back into records, skipping blank lines.
pub fn read_jsonl(path: &Path) -> Result<Vec<AuditRecord>, AuditError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn model_call(stage: Stage) -> AuditEvent {
        AuditEvent::ModelCall {
            stage,
            model: "mock-model".into(),
            prompt: vec![Message::user("Document: sky\nClaim: blue")],
            response: "Yes".into(),
            duration_ms: 12,
        }
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(model_call(Stage::Entailment).type_tag(), "model_call");
        let failed = AuditEvent::ValidationFailed {
            stage: Some(Stage::Omission),
            error: "bad json".into(),
        };
        assert_eq!(failed.type_tag(), "validation_failed");
        assert_eq!(failed.stage(), Some(Stage::Omission));
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(model_call(Stage::Contradiction)).unwrap();
        assert_eq!(json["type"], "model_call");
        assert_eq!(json["stage"], "contradiction");
        assert_eq!(json["prompt"][0]["role"], "user");
    }

    #[test]
    fn test_summary_truncates_long_text() {
        let event = AuditEvent::ValidationStarted {
            prompt: "x".repeat(200),
            output: String::new(),
            grounding_chars: 10,
        };
        let summary = event.summary();
        assert!(summary.contains('…'));
        assert!(summary.contains("grounding_chars=10"));
    }

    #[test]
    fn test_memory_sink_collects_records() {
        let sink = MemoryAuditSink::new();
        let id = Uuid::new_v4();
        sink.append(&AuditRecord::new(id, model_call(Stage::Entailment)))
            .unwrap();
        sink.append(&AuditRecord::new(
            id,
            AuditEvent::ValidationFailed {
                stage: None,
                error: "boom".into(),
            },
        ))
        .unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records_of("model_call").len(), 1);
        assert!(sink.records().iter().all(|r| r.validation_id == id));
    }

    #[test]
    fn test_file_sink_appends_jsonl_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");
        let id = Uuid::new_v4();

        {
            let sink = FileAuditSink::open(&path, AuditFormat::Jsonl).unwrap();
            sink.append(&AuditRecord::new(id, model_call(Stage::Entailment)))
                .unwrap();
        }
        // A second handle keeps appending rather than truncating.
        {
            let sink = FileAuditSink::open(&path, AuditFormat::Jsonl).unwrap();
            sink.append(&AuditRecord::new(id, model_call(Stage::Omission)))
                .unwrap();
        }

        let records = read_jsonl(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event.stage(), Some(Stage::Entailment));
        assert_eq!(records[1].event.stage(), Some(Stage::Omission));
    }

    #[test]
    fn test_file_sink_text_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let sink = FileAuditSink::open(&path, AuditFormat::Text).unwrap();
        sink.append(&AuditRecord::new(
            Uuid::new_v4(),
            model_call(Stage::Entailment),
        ))
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("model_call entailment via mock-model (12ms)"));
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let sink = NullAuditSink;
        assert!(
            sink.append(&AuditRecord::new(
                Uuid::new_v4(),
                model_call(Stage::Entailment)
            ))
            .is_ok()
        );
    }
}
