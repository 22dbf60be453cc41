//! Plain-text rendering of validation reports.

use ragcheck_eval::ValidationReport;
use std::fmt::Write;

/// Format an F1 score, spelling out the undefined case.
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(v) => format!("{:.3}", v),
        None => "undefined".to_string(),
    }
}

/// Render `report` for the terminal. `detailed` adds the per-claim table,
/// missed facts, and stage timings.
pub fn text_report(report: &ValidationReport, detailed: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Validation {}", report.validation_id);
    let _ = writeln!(
        out,
        "  F1 (classifier): {}",
        format_score(report.f1_classifier)
    );
    let _ = writeln!(out, "  F1 (judge):      {}", format_score(report.f1_judge));
    let _ = writeln!(
        out,
        "  Claims: {} ({})  supported: {}  contradicted: {}  unverifiable: {}  missed: {}",
        report.claim_count,
        report.decomposition,
        report.entailment_counts.yes,
        report.contradiction_counts.no,
        report.contradiction_counts.idk,
        report.missed_count,
    );

    if !detailed {
        return out;
    }

    if !report.claims.is_empty() {
        let _ = writeln!(out, "\nClaims:");
        for (i, c) in report.claims.iter().enumerate() {
            let verdict = c
                .verdict
                .as_ref()
                .map(|v| v.verdict.to_string())
                .unwrap_or_else(|| "-".to_string());
            let mark = if c.supported { "+" } else { "x" };
            let _ = writeln!(out, "  {:>2}. [{}] [{:<3}] {}", i + 1, mark, verdict, c.claim.trim());
            if let Some(reason) = c.verdict.as_ref().and_then(|v| v.reason.as_deref()) {
                let _ = writeln!(out, "          {}", reason);
            }
        }
    }

    if !report.missed_facts.is_empty() {
        let _ = writeln!(out, "\nMissed facts:");
        for m in &report.missed_facts {
            let _ = writeln!(out, "  - ({}) {}", m.importance, m.fact);
        }
    }

    let t = &report.stage_timings;
    let _ = writeln!(
        out,
        "\nTimings: decomposition {}ms, entailment {}ms, contradiction {}ms, omission {}ms, total {}ms",
        t.decomposition_ms, t.entailment_ms, t.contradiction_ms, t.omission_ms, t.total_ms
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcheck_eval::eval::claims::{Decomposition, DecompositionMode};
    use ragcheck_eval::eval::contradiction::{ContradictionOutcome, Verdict, VerdictLabel};
    use ragcheck_eval::eval::entailment::{EntailmentCounts, EntailmentOutcome};
    use ragcheck_eval::eval::omission::{Importance, MissedFact, OmissionOutcome};
    use ragcheck_eval::eval::report::{StageResults, StageTimings, aggregate};
    use uuid::Uuid;

    fn report() -> ValidationReport {
        let verdicts = vec![
            Verdict {
                verdict: VerdictLabel::Yes,
                reason: None,
            },
            Verdict {
                verdict: VerdictLabel::No,
                reason: Some("The context says Lyon.".into()),
            },
        ];
        let results = StageResults {
            decomposition: Decomposition {
                mode: DecompositionMode::Segmented,
                claims: vec!["Paris is in France. ".into(), "Paris is the capital.".into()],
            },
            entailment: EntailmentOutcome {
                supported: vec![true, false],
                counts: EntailmentCounts { yes: 1, no: 1 },
            },
            contradiction: ContradictionOutcome {
                counts: ragcheck_eval::eval::ContradictionCounts::from_verdicts(&verdicts),
                verdicts,
            },
            omission: OmissionOutcome::from_facts(vec![MissedFact {
                fact: "Paris hosts the Louvre.".into(),
                importance: Importance::Medium,
                reason: String::new(),
            }]),
        };
        aggregate(Uuid::nil(), results, StageTimings::default())
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(0.5)), "0.500");
        assert_eq!(format_score(Some(1.0)), "1.000");
        assert_eq!(format_score(None), "undefined");
    }

    #[test]
    fn test_summary_only() {
        let text = text_report(&report(), false);
        assert!(text.contains("F1 (classifier): 0.500"));
        assert!(text.contains("contradicted: 1"));
        assert!(!text.contains("Claims:\n"));
        assert!(!text.contains("Timings"));
    }

    #[test]
    fn test_detailed_lists_claims_and_misses() {
        let text = text_report(&report(), true);
        assert!(text.contains("1. [+] [yes] Paris is in France."));
        assert!(text.contains("2. [x] [no ] Paris is the capital."));
        assert!(text.contains("The context says Lyon."));
        assert!(text.contains("(medium) Paris hosts the Louvre."));
        assert!(text.contains("total 0ms"));
    }
}
