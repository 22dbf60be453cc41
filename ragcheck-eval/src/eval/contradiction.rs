//! Contradiction judge: one batched yes/no/idk verdict per claim.

use crate::error::EvalError;
use crate::eval::parser::parse_response;
use crate::eval::prompts::contradiction_prompt;
use crate::eval::trail::AuditTrail;
use ragcheck_core::audit::Stage;
use ragcheck_core::brain::LlmProvider;
use ragcheck_core::config::AlignmentPolicy;
use ragcheck_core::types::CompletionRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Verdict label. `no` is reserved for direct contradiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictLabel {
    #[serde(alias = "Yes", alias = "YES")]
    Yes,
    #[serde(alias = "No", alias = "NO")]
    No,
    #[serde(alias = "Idk", alias = "IDK")]
    Idk,
}

impl std::fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictLabel::Yes => write!(f, "yes"),
            VerdictLabel::No => write!(f, "no"),
            VerdictLabel::Idk => write!(f, "idk"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub verdict: VerdictLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Wire schema of the judge's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictList {
    pub verdicts: Vec<Verdict>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContradictionCounts {
    pub yes: usize,
    pub no: usize,
    pub idk: usize,
}

impl ContradictionCounts {
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        verdicts.iter().fold(Self::default(), |mut acc, v| {
            match v.verdict {
                VerdictLabel::Yes => acc.yes += 1,
                VerdictLabel::No => acc.no += 1,
                VerdictLabel::Idk => acc.idk += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.yes + self.no + self.idk
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContradictionOutcome {
    pub verdicts: Vec<Verdict>,
    pub counts: ContradictionCounts,
}

pub struct ContradictionJudge {
    provider: Arc<dyn LlmProvider>,
    alignment: AlignmentPolicy,
}

impl ContradictionJudge {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            alignment: AlignmentPolicy::default(),
        }
    }

    pub fn with_alignment(mut self, alignment: AlignmentPolicy) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Judge the full claim list in a single call.
    ///
    /// With no claims there is nothing to judge and the model is not called.
    pub async fn judge(
        &self,
        document: &str,
        claims: &[String],
        trail: &AuditTrail,
    ) -> Result<ContradictionOutcome, EvalError> {
        if claims.is_empty() {
            debug!("No claims to judge; skipping contradiction call");
            return Ok(ContradictionOutcome::default());
        }

        let messages = contradiction_prompt(document, claims);
        let started = Instant::now();
        let response = self
            .provider
            .complete(CompletionRequest::from_messages(messages.clone()))
            .await
            .map_err(|e| EvalError::transport(Stage::Contradiction, e))?;
        trail.model_call(
            Stage::Contradiction,
            self.provider.model_name(),
            &messages,
            response.text(),
            started.elapsed(),
        );

        let list: VerdictList = parse_response(response.text())
            .map_err(|e| EvalError::parse(Stage::Contradiction, e))?;

        if list.verdicts.len() != claims.len() {
            match self.alignment {
                AlignmentPolicy::Strict => {
                    return Err(EvalError::Misaligned {
                        stage: Stage::Contradiction,
                        expected: claims.len(),
                        actual: list.verdicts.len(),
                    });
                }
                AlignmentPolicy::Lenient => warn!(
                    expected = claims.len(),
                    actual = list.verdicts.len(),
                    "Verdict count does not match claim count; tallying as returned"
                ),
            }
        }

        let counts = ContradictionCounts::from_verdicts(&list.verdicts);
        Ok(ContradictionOutcome {
            verdicts: list.verdicts,
            counts,
        })
    }
}
