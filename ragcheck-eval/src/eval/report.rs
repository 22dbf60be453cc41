//! Validation report: the terminal product of a validation call.

use crate::eval::claims::{Decomposition, DecompositionMode};
use crate::eval::contradiction::{ContradictionCounts, ContradictionOutcome, Verdict};
use crate::eval::entailment::{EntailmentCounts, EntailmentOutcome};
use crate::eval::metrics::{Judgments, ScoringStrategy, StrategyScore, score_all};
use crate::eval::omission::{MissedFact, OmissionOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wall-clock milliseconds spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    pub decomposition_ms: u64,
    pub entailment_ms: u64,
    pub contradiction_ms: u64,
    pub omission_ms: u64,
    pub total_ms: u64,
}

/// Per-claim view of both judges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimAssessment {
    pub claim: String,
    pub supported: bool,
    /// `None` when the judge returned fewer verdicts than claims.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

/// Outputs of every stage, gathered for aggregation.
#[derive(Debug, Clone)]
pub struct StageResults {
    pub decomposition: Decomposition,
    pub entailment: EntailmentOutcome,
    pub contradiction: ContradictionOutcome,
    pub omission: OmissionOutcome,
}

impl StageResults {
    pub fn judgments(&self) -> Judgments {
        Judgments {
            entailment: self.entailment.counts,
            contradiction: self.contradiction.counts,
            missed_count: self.omission.missed_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub decomposition: DecompositionMode,
    pub claim_count: usize,
    pub entailment_counts: EntailmentCounts,
    pub contradiction_counts: ContradictionCounts,
    pub missed_count: usize,
    /// `None` when the score is undefined.
    pub f1_classifier: Option<f64>,
    /// `None` when the score is undefined.
    pub f1_judge: Option<f64>,
    pub scores: Vec<StrategyScore>,
    pub claims: Vec<ClaimAssessment>,
    pub missed_facts: Vec<MissedFact>,
    pub stage_timings: StageTimings,
}

impl ValidationReport {
    pub fn score(&self, strategy: ScoringStrategy) -> Option<f64> {
        match strategy {
            ScoringStrategy::Classifier => self.f1_classifier,
            ScoringStrategy::Judge => self.f1_judge,
        }
    }
}

/// Combine stage outputs into a report.
pub fn aggregate(
    validation_id: Uuid,
    results: StageResults,
    stage_timings: StageTimings,
) -> ValidationReport {
    let judgments = results.judgments();
    let scores = score_all(&judgments);
    let f1_of = |strategy: ScoringStrategy| {
        scores
            .iter()
            .find(|s| s.strategy == strategy)
            .and_then(|s| s.f1)
    };
    let f1_classifier = f1_of(ScoringStrategy::Classifier);
    let f1_judge = f1_of(ScoringStrategy::Judge);

    let mut verdicts = results.contradiction.verdicts.into_iter();
    let claims: Vec<ClaimAssessment> = results
        .decomposition
        .claims
        .into_iter()
        .zip(results.entailment.supported.iter().copied())
        .map(|(claim, supported)| ClaimAssessment {
            claim,
            supported,
            verdict: verdicts.next(),
        })
        .collect();

    ValidationReport {
        validation_id,
        completed_at: Utc::now(),
        decomposition: results.decomposition.mode,
        claim_count: claims.len(),
        entailment_counts: judgments.entailment,
        contradiction_counts: judgments.contradiction,
        missed_count: judgments.missed_count,
        f1_classifier,
        f1_judge,
        scores,
        claims,
        missed_facts: results.omission.missed_facts,
        stage_timings,
    }
}
