//! Property-based tests for the pure verification components using proptest.

use proptest::prelude::*;
use std::collections::HashSet;

use ragcheck_eval::eval::claims::{DecompositionMode, decompose};
use ragcheck_eval::eval::metrics::{Confusion, Judgments, ScoringStrategy};
use ragcheck_eval::eval::omission::{Importance, MissedFact, OmissionOutcome};
use ragcheck_eval::eval::parser::{parse_response, strip_fence};
use ragcheck_eval::rag::{GroundingPassage, assemble};

// --- Grounding assembly properties ---

fn passages() -> impl Strategy<Value = Vec<GroundingPassage>> {
    prop::collection::vec(("[a-e]", "[A-Za-z ]{1,20}"), 0..30).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(id, text)| GroundingPassage::new(id, text))
            .collect()
    })
}

proptest! {
    #[test]
    fn assemble_keeps_first_text_per_id_in_order(passages in passages()) {
        let doc = assemble(&passages);

        let mut seen = HashSet::new();
        let mut expected = String::new();
        let mut expected_ids = Vec::new();
        for p in &passages {
            if seen.insert(p.id.clone()) {
                expected.push_str(&p.text);
                expected.push('\n');
                expected_ids.push(p.id.clone());
            }
        }

        prop_assert_eq!(doc.text, expected);
        prop_assert_eq!(doc.passage_ids, expected_ids);
    }

    #[test]
    fn assemble_is_idempotent_over_duplicates(passages in passages()) {
        let mut doubled = passages.clone();
        doubled.extend(passages.iter().cloned());
        prop_assert_eq!(assemble(&doubled), assemble(&passages));
    }
}

// --- Claim decomposition properties ---

proptest! {
    #[test]
    fn json_array_claims_are_verbatim(claims in prop::collection::vec(".{0,40}", 0..10)) {
        let output = serde_json::to_string(&claims).unwrap();
        let d = decompose(&output);
        prop_assert_eq!(d.mode, DecompositionMode::PreDecomposed);
        prop_assert_eq!(d.claims, claims);
    }

    #[test]
    fn segmented_claims_are_never_blank(text in "[A-Za-z ,.!?\n]{0,200}") {
        let d = decompose(&text);
        for claim in &d.claims {
            prop_assert!(!claim.trim().is_empty());
        }
    }
}

// --- Response parser properties ---

proptest! {
    #[test]
    fn fenced_and_bare_payloads_parse_identically(
        items in prop::collection::vec(0u32..1000, 0..20),
        tag in prop::sample::select(vec!["", "json", "JSON"]),
    ) {
        let bare = serde_json::json!({ "items": items }).to_string();
        let fenced = format!("```{}\n{}\n```", tag, bare);
        let a: serde_json::Value = parse_response(&bare).unwrap();
        let b: serde_json::Value = parse_response(&fenced).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn opening_fence_without_close_is_rejected(body in "[a-z0-9{}\":, ]{1,50}") {
        let raw = format!("```json\n{}", body);
        prop_assert!(strip_fence(&raw).is_err());
    }
}

// --- Metric properties ---

proptest! {
    #[test]
    fn f1_is_bounded_or_undefined(tp in 0usize..50, fp in 0usize..50, fn_ in 0usize..50) {
        let f1 = Confusion::new(tp, fp, fn_).f1();
        if tp + fp + fn_ == 0 {
            prop_assert_eq!(f1, None);
        } else {
            let v = f1.unwrap();
            prop_assert!((0.0..=1.0).contains(&v));
            prop_assert_eq!(v == 1.0, fp + fn_ == 0);
        }
    }

    #[test]
    fn strategies_share_the_miss_count(
        yes in 0usize..20, no in 0usize..20, idk in 0usize..20, missed in 0usize..20,
    ) {
        let judgments = Judgments {
            entailment: ragcheck_eval::eval::EntailmentCounts { yes, no },
            contradiction: ragcheck_eval::eval::ContradictionCounts { yes, no, idk },
            missed_count: missed,
        };
        let classifier = ScoringStrategy::Classifier.confusion(&judgments);
        let judge = ScoringStrategy::Judge.confusion(&judgments);
        prop_assert_eq!(classifier.false_negatives, judge.false_negatives);
        prop_assert_eq!(judge.false_positives, no + idk);
        // With no idk verdicts and matching tallies the two scores agree.
        if idk == 0 {
            prop_assert_eq!(classifier, judge);
        }
    }

    #[test]
    fn low_omissions_never_count(
        levels in prop::collection::vec(
            prop::sample::select(vec![Importance::High, Importance::Medium, Importance::Low]),
            0..20,
        ),
    ) {
        let facts: Vec<MissedFact> = levels
            .iter()
            .enumerate()
            .map(|(i, importance)| MissedFact {
                fact: format!("fact {}", i),
                importance: *importance,
                reason: String::new(),
            })
            .collect();
        let outcome = OmissionOutcome::from_facts(facts);
        let expected = levels.iter().filter(|l| **l != Importance::Low).count();
        prop_assert_eq!(outcome.missed_count, expected);
    }
}
