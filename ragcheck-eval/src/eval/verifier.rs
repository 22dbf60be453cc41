//! Verifier: runs one validation call end to end.
//!
//! Stage order: decomposition, entailment fan-out, contradiction, omission,
//! aggregation. Contradiction and omission run one after the other once the
//! fan-out has joined. Any stage error ends the call without a report.

use crate::error::EvalError;
use crate::eval::claims::decompose;
use crate::eval::contradiction::ContradictionJudge;
use crate::eval::entailment::EntailmentJudge;
use crate::eval::omission::OmissionDetector;
use crate::eval::report::{StageResults, StageTimings, ValidationReport, aggregate};
use crate::eval::trail::{AuditTrail, millis};
use crate::rag::grounding::{GroundingDocument, GroundingPassage, assemble};
use crate::rag::retriever::{RetrievalQuery, Retriever};
use ragcheck_core::audit::{AuditEvent, AuditSink, NullAuditSink, Stage};
use ragcheck_core::brain::LlmProvider;
use ragcheck_core::config::{AlignmentPolicy, VerifierConfig};
use ragcheck_core::error::LlmError;
use ragcheck_core::providers::create_provider;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct Verifier {
    entailment: EntailmentJudge,
    contradiction: ContradictionJudge,
    omission: OmissionDetector,
    audit: Arc<dyn AuditSink>,
    context_window: usize,
}

/// Rough token estimate for a grounding document, four characters a token.
pub fn estimate_tokens(chars: usize) -> usize {
    chars.div_ceil(4)
}

impl Verifier {
    /// Build a verifier from its two models.
    ///
    /// `entailment_model` answers the per-claim "Yes"/other check;
    /// `judge_model` serves both the contradiction judge and the omission
    /// detector. Auditing is off until [`Verifier::with_audit`] is called.
    pub fn new(entailment_model: Arc<dyn LlmProvider>, judge_model: Arc<dyn LlmProvider>) -> Self {
        let context_window = entailment_model
            .context_window()
            .min(judge_model.context_window());
        Self {
            entailment: EntailmentJudge::new(entailment_model),
            contradiction: ContradictionJudge::new(Arc::clone(&judge_model)),
            omission: OmissionDetector::new(judge_model),
            audit: Arc::new(NullAuditSink),
            context_window,
        }
    }

    /// Build providers for both models from configuration.
    pub fn from_config(config: &VerifierConfig) -> Result<Self, LlmError> {
        let entailment = create_provider(&config.entailment)?;
        let judge = create_provider(&config.judge)?;
        Ok(Self::new(entailment, judge).with_alignment(config.alignment))
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_alignment(mut self, alignment: AlignmentPolicy) -> Self {
        self.contradiction = self.contradiction.with_alignment(alignment);
        self
    }

    /// The smaller context window of the two models, in tokens.
    pub fn context_window(&self) -> usize {
        self.context_window
    }

    /// Whether `document` is estimated to fit both models' context windows.
    pub fn fits_context(&self, document: &GroundingDocument) -> bool {
        estimate_tokens(document.char_count()) < self.context_window
    }

    /// Validate `output` against a plain-text grounding document.
    pub async fn validate(
        &self,
        prompt: &str,
        grounding_document: &str,
        output: &str,
    ) -> Result<ValidationReport, EvalError> {
        self.validate_document(prompt, &GroundingDocument::from(grounding_document), output)
            .await
    }

    /// Validate `output` against an assembled grounding document.
    pub async fn validate_document(
        &self,
        prompt: &str,
        document: &GroundingDocument,
        output: &str,
    ) -> Result<ValidationReport, EvalError> {
        let trail = AuditTrail::new(Uuid::new_v4(), Arc::clone(&self.audit));
        self.execute(&trail, prompt, document, output, Instant::now())
            .await
    }

    /// Assemble `passages` and validate `output` against the result.
    pub async fn validate_passages(
        &self,
        prompt: &str,
        passages: &[GroundingPassage],
        output: &str,
    ) -> Result<ValidationReport, EvalError> {
        self.validate_document(prompt, &assemble(passages), output)
            .await
    }

    /// Fetch passages from `retriever`, assemble them, and validate.
    pub async fn validate_retrieved(
        &self,
        retriever: &dyn Retriever,
        query: &RetrievalQuery,
        prompt: &str,
        output: &str,
    ) -> Result<ValidationReport, EvalError> {
        let trail = AuditTrail::new(Uuid::new_v4(), Arc::clone(&self.audit));
        let started = Instant::now();

        let passages = match retriever.query(query.filter.as_ref(), query.limit).await {
            Ok(passages) => passages,
            Err(e) => {
                let err = EvalError::from(e);
                self.fail(&trail, &err);
                return Err(err);
            }
        };
        let document = assemble(&passages);
        trail.stage_completed(
            Stage::Retrieval,
            started.elapsed(),
            json!({
                "returned": passages.len(),
                "unique": document.passage_ids.len(),
                "filter": query.filter.as_ref().map(|f| f.to_string()),
                "limit": query.limit,
            }),
        );

        self.execute(&trail, prompt, &document, output, started)
            .await
    }

    async fn execute(
        &self,
        trail: &AuditTrail,
        prompt: &str,
        document: &GroundingDocument,
        output: &str,
        started: Instant,
    ) -> Result<ValidationReport, EvalError> {
        trail.record(AuditEvent::ValidationStarted {
            prompt: prompt.to_string(),
            output: output.to_string(),
            grounding_chars: document.char_count(),
        });
        if !self.fits_context(document) {
            warn!(
                validation_id = %trail.validation_id(),
                estimated_tokens = estimate_tokens(document.char_count()),
                context_window = self.context_window,
                "Grounding document may exceed the model context window"
            );
        }

        match self.run_stages(trail, prompt, document, output, started).await {
            Ok(report) => {
                info!(
                    validation_id = %report.validation_id,
                    claims = report.claim_count,
                    missed = report.missed_count,
                    f1_classifier = ?report.f1_classifier,
                    f1_judge = ?report.f1_judge,
                    total_ms = report.stage_timings.total_ms,
                    "Validation completed"
                );
                match serde_json::to_value(&report) {
                    Ok(value) => trail.record(AuditEvent::ValidationCompleted { report: value }),
                    Err(e) => warn!(error = %e, "Failed to serialize report for audit log"),
                }
                Ok(report)
            }
            Err(err) => {
                self.fail(trail, &err);
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        trail: &AuditTrail,
        prompt: &str,
        document: &GroundingDocument,
        output: &str,
        started: Instant,
    ) -> Result<ValidationReport, EvalError> {
        let mut timings = StageTimings::default();

        let stage_start = Instant::now();
        let decomposition = decompose(output);
        let elapsed = stage_start.elapsed();
        timings.decomposition_ms = millis(elapsed);
        trail.record(AuditEvent::ClaimsDecomposed {
            mode: decomposition.mode.to_string(),
            claims: decomposition.claims.clone(),
        });
        trail.stage_completed(
            Stage::Decomposition,
            elapsed,
            json!({ "mode": decomposition.mode.to_string(), "claims": decomposition.len() }),
        );

        let stage_start = Instant::now();
        let entailment = self
            .entailment
            .judge(document.as_str(), &decomposition.claims, trail)
            .await?;
        let elapsed = stage_start.elapsed();
        timings.entailment_ms = millis(elapsed);
        info!(
            yes = entailment.counts.yes,
            no = entailment.counts.no,
            elapsed_ms = timings.entailment_ms,
            "Entailment stage completed"
        );
        trail.stage_completed(
            Stage::Entailment,
            elapsed,
            json!({ "yes": entailment.counts.yes, "no": entailment.counts.no }),
        );

        let stage_start = Instant::now();
        let contradiction = self
            .contradiction
            .judge(document.as_str(), &decomposition.claims, trail)
            .await?;
        let elapsed = stage_start.elapsed();
        timings.contradiction_ms = millis(elapsed);
        info!(
            yes = contradiction.counts.yes,
            no = contradiction.counts.no,
            idk = contradiction.counts.idk,
            elapsed_ms = timings.contradiction_ms,
            "Contradiction stage completed"
        );
        trail.stage_completed(
            Stage::Contradiction,
            elapsed,
            json!({
                "yes": contradiction.counts.yes,
                "no": contradiction.counts.no,
                "idk": contradiction.counts.idk,
            }),
        );

        let stage_start = Instant::now();
        let omission = self
            .omission
            .detect(prompt, document.as_str(), &decomposition.claims, trail)
            .await?;
        let elapsed = stage_start.elapsed();
        timings.omission_ms = millis(elapsed);
        info!(
            missed = omission.missed_facts.len(),
            penalized = omission.missed_count,
            elapsed_ms = timings.omission_ms,
            "Omission stage completed"
        );
        trail.stage_completed(
            Stage::Omission,
            elapsed,
            json!({
                "missed_facts": omission.missed_facts.len(),
                "missed_count": omission.missed_count,
            }),
        );

        let stage_start = Instant::now();
        timings.total_ms = millis(started.elapsed());
        let results = StageResults {
            decomposition,
            entailment,
            contradiction,
            omission,
        };
        let report = aggregate(trail.validation_id(), results, timings);
        trail.stage_completed(
            Stage::Aggregation,
            stage_start.elapsed(),
            json!({
                "f1_classifier": report.f1_classifier,
                "f1_judge": report.f1_judge,
            }),
        );
        Ok(report)
    }

    fn fail(&self, trail: &AuditTrail, err: &EvalError) {
        error!(
            validation_id = %trail.validation_id(),
            stage = %err.stage(),
            error = %err,
            "Validation failed"
        );
        trail.record(AuditEvent::ValidationFailed {
            stage: Some(err.stage()),
            error: err.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcheck_core::audit::MemoryAuditSink;
    use ragcheck_core::brain::MockLlmProvider;

    #[tokio::test]
    async fn test_validate_records_lifecycle() {
        let entail = Arc::new(MockLlmProvider::with_response("Yes"));
        let judge = Arc::new(MockLlmProvider::with_responder(|req| {
            Ok(if req.messages[0].content.contains("missed_facts") {
                r#"{"missed_facts": []}"#.to_string()
            } else {
                r#"{"verdicts": [{"verdict": "yes"}]}"#.to_string()
            })
        }));
        let sink = Arc::new(MemoryAuditSink::new());
        let verifier = Verifier::new(entail, judge).with_audit(sink.clone());

        let report = verifier
            .validate("What color is the sky?", "The sky is blue.\n", "The sky is blue.")
            .await
            .unwrap();
        assert_eq!(report.claim_count, 1);
        assert_eq!(report.f1_classifier, Some(1.0));
        assert_eq!(report.f1_judge, Some(1.0));

        let tags: Vec<&str> = sink.records().iter().map(|r| r.event.type_tag()).collect();
        assert_eq!(tags.first(), Some(&"validation_started"));
        assert_eq!(tags.last(), Some(&"validation_completed"));
        assert_eq!(sink.records_of("model_call").len(), 3);
        let stages: Vec<Stage> = sink
            .records_of("stage_completed")
            .iter()
            .filter_map(|r| r.event.stage())
            .collect();
        assert_eq!(
            stages,
            vec![
                Stage::Decomposition,
                Stage::Entailment,
                Stage::Contradiction,
                Stage::Omission,
                Stage::Aggregation,
            ]
        );
        assert!(
            sink.records()
                .iter()
                .all(|r| r.validation_id == report.validation_id)
        );
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(0), 0);
        assert_eq!(estimate_tokens(4), 1);
        assert_eq!(estimate_tokens(5), 2);
    }

    #[test]
    fn test_context_window_is_smaller_of_models() {
        let entail = Arc::new(MockLlmProvider::new().with_context_window(8));
        let judge = Arc::new(MockLlmProvider::new().with_context_window(64));
        let verifier = Verifier::new(entail, judge);
        assert_eq!(verifier.context_window(), 8);

        assert!(verifier.fits_context(&GroundingDocument::from("short")));
        let long = "x".repeat(40);
        assert!(!verifier.fits_context(&GroundingDocument::from(long.as_str())));
    }

    #[test]
    fn test_from_config_unknown_provider() {
        let mut config = VerifierConfig::default();
        config.judge.provider = "carrier-pigeon".into();
        assert!(matches!(
            Verifier::from_config(&config),
            Err(LlmError::UnknownProvider { .. })
        ));
    }
}
