//! Metric aggregation: F1 scores from judge tallies.
//!
//! Both scores use `F1 = TP / (TP + (FP + FN) / 2)`. They differ only in
//! which judge supplies TP and FP; FN is always the count of penalizing
//! omissions. An empty denominator gives `None` rather than zero.

use crate::eval::contradiction::ContradictionCounts;
use crate::eval::entailment::EntailmentCounts;
use serde::{Deserialize, Serialize};

/// Raw confusion counts for one scoring strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl Confusion {
    pub fn new(true_positives: usize, false_positives: usize, false_negatives: usize) -> Self {
        Self {
            true_positives,
            false_positives,
            false_negatives,
        }
    }

    /// `TP / (TP + (FP + FN) / 2)`, or `None` when all counts are zero.
    pub fn f1(&self) -> Option<f64> {
        let tp = self.true_positives as f64;
        let denom = tp + (self.false_positives + self.false_negatives) as f64 / 2.0;
        if denom == 0.0 { None } else { Some(tp / denom) }
    }

    pub fn precision(&self) -> Option<f64> {
        let denom = self.true_positives + self.false_positives;
        if denom == 0 {
            None
        } else {
            Some(self.true_positives as f64 / denom as f64)
        }
    }

    pub fn recall(&self) -> Option<f64> {
        let denom = self.true_positives + self.false_negatives;
        if denom == 0 {
            None
        } else {
            Some(self.true_positives as f64 / denom as f64)
        }
    }
}

/// Everything the scoring strategies read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgments {
    pub entailment: EntailmentCounts,
    pub contradiction: ContradictionCounts,
    pub missed_count: usize,
}

/// Which judge's verdicts define true and false positives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// TP = supported claims, FP = unsupported claims.
    Classifier,
    /// TP = `yes` verdicts, FP = `no` + `idk` verdicts.
    Judge,
}

impl ScoringStrategy {
    pub const ALL: [ScoringStrategy; 2] = [ScoringStrategy::Classifier, ScoringStrategy::Judge];

    pub fn confusion(self, judgments: &Judgments) -> Confusion {
        match self {
            ScoringStrategy::Classifier => Confusion::new(
                judgments.entailment.yes,
                judgments.entailment.no,
                judgments.missed_count,
            ),
            ScoringStrategy::Judge => Confusion::new(
                judgments.contradiction.yes,
                judgments.contradiction.no + judgments.contradiction.idk,
                judgments.missed_count,
            ),
        }
    }

    pub fn f1(self, judgments: &Judgments) -> Option<f64> {
        self.confusion(judgments).f1()
    }
}

impl std::fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringStrategy::Classifier => write!(f, "classifier"),
            ScoringStrategy::Judge => write!(f, "judge"),
        }
    }
}

/// Score of one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyScore {
    pub strategy: ScoringStrategy,
    pub confusion: Confusion,
    pub f1: Option<f64>,
}

/// Evaluate every strategy against the same judgments.
pub fn score_all(judgments: &Judgments) -> Vec<StrategyScore> {
    ScoringStrategy::ALL
        .iter()
        .map(|&strategy| {
            let confusion = strategy.confusion(judgments);
            StrategyScore {
                strategy,
                confusion,
                f1: confusion.f1(),
            }
        })
        .collect()
}
