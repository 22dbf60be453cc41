//! Entailment judge: per-claim support check with a narrow classifier.
//!
//! Each claim gets its own model call and all calls run at once. The stage
//! is all-or-nothing: the first failed call aborts the calls still in
//! flight and no partial result escapes.

use crate::error::EvalError;
use crate::eval::prompts::entailment_prompt;
use crate::eval::trail::AuditTrail;
use ragcheck_core::audit::Stage;
use ragcheck_core::brain::LlmProvider;
use ragcheck_core::error::LlmError;
use ragcheck_core::types::CompletionRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// The only reply that counts as support. Compared exactly.
pub const SUPPORTED_REPLY: &str = "Yes";

/// Tally of entailment results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntailmentCounts {
    pub yes: usize,
    pub no: usize,
}

impl EntailmentCounts {
    pub fn from_results(supported: &[bool]) -> Self {
        let yes = supported.iter().filter(|s| **s).count();
        Self {
            yes,
            no: supported.len() - yes,
        }
    }
}

/// Result of the entailment stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntailmentOutcome {
    /// One entry per claim, in claim order.
    pub supported: Vec<bool>,
    pub counts: EntailmentCounts,
}

#[derive(Clone)]
pub struct EntailmentJudge {
    provider: Arc<dyn LlmProvider>,
}

impl EntailmentJudge {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Ask the classifier whether `document` supports `claim`.
    pub async fn check_claim(
        &self,
        document: &str,
        claim: &str,
        trail: &AuditTrail,
    ) -> Result<bool, LlmError> {
        let messages = entailment_prompt(document, claim);
        let request = CompletionRequest::from_messages(messages.clone());
        let started = Instant::now();
        let response = self.provider.complete(request).await?;
        let reply = response.text();
        let supported = reply == SUPPORTED_REPLY;

        debug!(
            model = %self.provider.model_name(),
            supported,
            reply = %reply,
            tokens = response.usage.total(),
            "Entailment call completed"
        );
        trail.model_call(
            Stage::Entailment,
            self.provider.model_name(),
            &messages,
            reply,
            started.elapsed(),
        );
        Ok(supported)
    }

    /// Check every claim concurrently.
    ///
    /// Returns results aligned with `claims`. Fails on the first transport
    /// error or task panic after aborting all outstanding calls.
    pub async fn judge(
        &self,
        document: &str,
        claims: &[String],
        trail: &AuditTrail,
    ) -> Result<EntailmentOutcome, EvalError> {
        let document: Arc<str> = Arc::from(document);
        let mut tasks = JoinSet::new();
        for (idx, claim) in claims.iter().cloned().enumerate() {
            let judge = self.clone();
            let document = Arc::clone(&document);
            let trail = trail.clone();
            tasks.spawn(async move { (idx, judge.check_claim(&document, &claim, &trail).await) });
        }

        let mut results: Vec<Option<bool>> = vec![None; claims.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Ok(supported))) => results[idx] = Some(supported),
                Ok((idx, Err(source))) => {
                    tasks.abort_all();
                    warn!(claim_index = idx, error = %source, "Entailment call failed; aborting stage");
                    return Err(EvalError::transport(Stage::Entailment, source));
                }
                Err(join_err) => {
                    tasks.abort_all();
                    warn!(error = %join_err, "Entailment task failed; aborting stage");
                    return Err(EvalError::TaskFailed {
                        stage: Stage::Entailment,
                        message: join_err.to_string(),
                    });
                }
            }
        }

        let supported = results
            .into_iter()
            .collect::<Option<Vec<bool>>>()
            .ok_or_else(|| EvalError::TaskFailed {
                stage: Stage::Entailment,
                message: "a claim finished without a result".to_string(),
            })?;
        let counts = EntailmentCounts::from_results(&supported);
        Ok(EntailmentOutcome { supported, counts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcheck_core::brain::MockLlmProvider;

    fn claims(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_check_claim_exact_match_only() {
        for (reply, expected) in [
            ("Yes", true),
            ("yes", false),
            ("Yes.", false),
            (" Yes", false),
            ("No", false),
        ] {
            let judge = EntailmentJudge::new(Arc::new(MockLlmProvider::with_response(reply)));
            let supported = judge
                .check_claim("doc", "claim", &AuditTrail::disabled())
                .await
                .unwrap();
            assert_eq!(supported, expected, "reply {:?}", reply);
        }
    }

    #[tokio::test]
    async fn test_judge_results_follow_claim_order() {
        let provider = Arc::new(MockLlmProvider::with_responder(|req| {
            let prompt = &req.messages[0].content;
            Ok(if prompt.ends_with("Claim: supported") { "Yes" } else { "No" }.to_string())
        }));
        let judge = EntailmentJudge::new(provider.clone());
        let outcome = judge
            .judge(
                "doc",
                &claims(&["supported", "unsupported", "supported", "other"]),
                &AuditTrail::disabled(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.supported, vec![true, false, true, false]);
        assert_eq!(outcome.counts, EntailmentCounts { yes: 2, no: 2 });
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn test_judge_no_claims_makes_no_calls() {
        let provider = Arc::new(MockLlmProvider::with_response("Yes"));
        let judge = EntailmentJudge::new(provider.clone());
        let outcome = judge.judge("doc", &[], &AuditTrail::disabled()).await.unwrap();
        assert!(outcome.supported.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_judge_transport_error_fails_stage() {
        let provider = Arc::new(MockLlmProvider::with_responder(|req| {
            if req.messages[0].content.ends_with("bad") {
                Err(LlmError::Connection {
                    message: "reset".into(),
                })
            } else {
                Ok("Yes".into())
            }
        }));
        let judge = EntailmentJudge::new(provider);
        let err = judge
            .judge("doc", &claims(&["good", "bad", "good"]), &AuditTrail::disabled())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EvalError::Transport {
                stage: Stage::Entailment,
                ..
            }
        ));
    }

    #[test]
    fn test_counts_from_results() {
        let counts = EntailmentCounts::from_results(&[true, false, false]);
        assert_eq!(counts, EntailmentCounts { yes: 1, no: 2 });
    }
}
