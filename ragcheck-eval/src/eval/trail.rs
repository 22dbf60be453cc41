//! Per-call audit trail.
//!
//! Binds one validation id to the injected [`AuditSink`]. Appends never fail
//! the caller: a sink error is logged and dropped.

use ragcheck_core::audit::{AuditEvent, AuditRecord, AuditSink, Stage};
use ragcheck_core::types::Message;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct AuditTrail {
    validation_id: Uuid,
    sink: Arc<dyn AuditSink>,
}

impl AuditTrail {
    pub fn new(validation_id: Uuid, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            validation_id,
            sink,
        }
    }

    /// A trail that discards everything.
    pub fn disabled() -> Self {
        Self::new(
            Uuid::nil(),
            Arc::new(ragcheck_core::audit::NullAuditSink),
        )
    }

    pub fn validation_id(&self) -> Uuid {
        self.validation_id
    }

    pub fn record(&self, event: AuditEvent) {
        let record = AuditRecord::new(self.validation_id, event);
        if let Err(e) = self.sink.append(&record) {
            warn!(
                validation_id = %self.validation_id,
                event = record.event.type_tag(),
                error = %e,
                "Failed to append audit record"
            );
        }
    }

    pub fn model_call(
        &self,
        stage: Stage,
        model: &str,
        prompt: &[Message],
        response: &str,
        elapsed: Duration,
    ) {
        self.record(AuditEvent::ModelCall {
            stage,
            model: model.to_string(),
            prompt: prompt.to_vec(),
            response: response.to_string(),
            duration_ms: millis(elapsed),
        });
    }

    pub fn stage_completed(&self, stage: Stage, elapsed: Duration, detail: serde_json::Value) {
        self.record(AuditEvent::StageCompleted {
            stage,
            duration_ms: millis(elapsed),
            detail,
        });
    }
}

pub(crate) fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
