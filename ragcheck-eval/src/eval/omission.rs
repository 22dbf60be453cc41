//! Omission detector: grounding facts the answer left out.

use crate::error::EvalError;
use crate::eval::parser::parse_response;
use crate::eval::prompts::omission_prompt;
use crate::eval::trail::AuditTrail;
use ragcheck_core::audit::Stage;
use ragcheck_core::brain::LlmProvider;
use ragcheck_core::types::CompletionRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

impl Importance {
    /// Whether an omission of this importance lowers the score.
    pub fn penalizes(self) -> bool {
        matches!(self, Importance::High | Importance::Medium)
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Importance::High => write!(f, "high"),
            Importance::Medium => write!(f, "medium"),
            Importance::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedFact {
    pub fact: String,
    /// Carried on the wire as `value`.
    #[serde(rename = "value")]
    pub importance: Importance,
    #[serde(default)]
    pub reason: String,
}

/// Wire schema of the detector's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedFactList {
    pub missed_facts: Vec<MissedFact>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmissionOutcome {
    pub missed_facts: Vec<MissedFact>,
    /// Number of `high` and `medium` omissions.
    pub missed_count: usize,
}

impl OmissionOutcome {
    pub fn from_facts(missed_facts: Vec<MissedFact>) -> Self {
        let missed_count = missed_facts
            .iter()
            .filter(|f| f.importance.penalizes())
            .count();
        Self {
            missed_facts,
            missed_count,
        }
    }
}

pub struct OmissionDetector {
    provider: Arc<dyn LlmProvider>,
}

impl OmissionDetector {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Ask the model which relevant grounding facts `claims` omit.
    pub async fn detect(
        &self,
        question: &str,
        document: &str,
        claims: &[String],
        trail: &AuditTrail,
    ) -> Result<OmissionOutcome, EvalError> {
        let messages = omission_prompt(question, document, claims);
        let started = Instant::now();
        let response = self
            .provider
            .complete(CompletionRequest::from_messages(messages.clone()))
            .await
            .map_err(|e| EvalError::transport(Stage::Omission, e))?;
        trail.model_call(
            Stage::Omission,
            self.provider.model_name(),
            &messages,
            response.text(),
            started.elapsed(),
        );

        let list: MissedFactList =
            parse_response(response.text()).map_err(|e| EvalError::parse(Stage::Omission, e))?;
        Ok(OmissionOutcome::from_facts(list.missed_facts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcheck_core::brain::MockLlmProvider;

    #[tokio::test]
    async fn test_low_importance_not_counted() {
        let reply = r#"```json
{"missed_facts": [
  {"fact": "Paris has 2.1M residents", "value": "high", "reason": "asked about size"},
  {"fact": "The Seine crosses Paris", "value": "medium", "reason": "geography"},
  {"fact": "Paris hosted the 1900 Olympics", "value": "low", "reason": "trivia"}
]}
```"#;
        let detector = OmissionDetector::new(Arc::new(MockLlmProvider::with_response(reply)));
        let outcome = detector
            .detect("Tell me about Paris", "doc", &["Paris is big.".into()], &AuditTrail::disabled())
            .await
            .unwrap();
        assert_eq!(outcome.missed_facts.len(), 3);
        assert_eq!(outcome.missed_count, 2);
    }

    #[tokio::test]
    async fn test_empty_list() {
        let detector = OmissionDetector::new(Arc::new(MockLlmProvider::with_response(
            r#"{"missed_facts": []}"#,
        )));
        let outcome = detector
            .detect("q", "doc", &[], &AuditTrail::disabled())
            .await
            .unwrap();
        assert_eq!(outcome, OmissionOutcome::default());
    }

    #[tokio::test]
    async fn test_wrong_shape_is_schema_error() {
        let detector = OmissionDetector::new(Arc::new(MockLlmProvider::with_response(
            r#"{"missed_facts": [{"fact": "x", "value": "critical"}]}"#,
        )));
        let err = detector
            .detect("q", "doc", &[], &AuditTrail::disabled())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EvalError::Parse {
                stage: Stage::Omission,
                source: crate::error::ParseError::Schema(_)
            }
        ));
    }

    #[test]
    fn test_importance_wire_name() {
        let fact: MissedFact =
            serde_json::from_str(r#"{"fact": "f", "value": "low", "reason": "r"}"#).unwrap();
        assert_eq!(fact.importance, Importance::Low);
        assert!(!fact.importance.penalizes());
        let json = serde_json::to_value(&fact).unwrap();
        assert_eq!(json["value"], "low");
    }
}
