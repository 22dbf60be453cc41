//! Prompt templates for the three model-backed stages.

use ragcheck_core::types::Message;

/// Instructions for the contradiction judge.
pub const CONTRADICTION_SYSTEM: &str = r#"You are a meticulous fact checker. You are given a context and a numbered list of claims.
For EACH claim, decide whether the context directly contradicts it.

Answer with a JSON object of the form:
{"verdicts": [{"verdict": "yes" | "no" | "idk", "reason": "<short explanation>"}]}

Rules:
- Return exactly one verdict per claim, in the same order as the claims.
- "yes": the context supports the claim.
- "no": the context DIRECTLY contradicts the claim. Use "no" only for a direct contradiction.
- "idk": the context neither supports nor contradicts the claim. Missing information,
  hedged claims, and speculative claims ("might", "could", "possibly") are "idk", never "no".
- The "reason" field is optional for "yes" and required for "no" and "idk".
- Output only the JSON object.

Example
Context:
Einstein won the Nobel Prize in Physics in 1921 for his discovery of the photoelectric effect. He was born in Germany.

Claims:
1. Einstein won the Nobel Prize for his discovery of the photoelectric effect.
2. Einstein won the Nobel Prize in 1968.
3. Einstein was a German chef.
4. Einstein might have enjoyed sailing.

Answer:
{"verdicts": [
  {"verdict": "yes"},
  {"verdict": "no", "reason": "The context says the prize was awarded in 1921, not 1968."},
  {"verdict": "idk", "reason": "The context never mentions Einstein's occupation as a chef."},
  {"verdict": "idk", "reason": "The claim is speculative and the context says nothing about sailing."}
]}"#;

/// Instructions for the omission detector.
pub const OMISSION_SYSTEM: &str = r#"You are reviewing an answer for completeness. You are given the question that was asked,
the context the answer should be grounded in, and the claims the answer makes.

List the facts from the context that are relevant to the question but missing from the claims.
Rate each missed fact's importance for answering the question as "high", "medium" or "low".

Answer with a JSON object of the form:
{"missed_facts": [{"fact": "<missed fact>", "value": "high" | "medium" | "low", "reason": "<why it matters>"}]}

If nothing relevant is missing, answer {"missed_facts": []}. Output only the JSON object."#;

/// The two-field prompt sent to the entailment classifier.
pub fn entailment_prompt(document: &str, claim: &str) -> Vec<Message> {
    vec![Message::user(format!(
        "Document: {}\nClaim: {}",
        document, claim
    ))]
}

pub fn contradiction_prompt(document: &str, claims: &[String]) -> Vec<Message> {
    vec![
        Message::system(CONTRADICTION_SYSTEM),
        Message::user(format!(
            "Context:\n{}\n\nClaims:\n{}\n\nAnswer:",
            document.trim_end(),
            numbered(claims)
        )),
    ]
}

pub fn omission_prompt(question: &str, document: &str, claims: &[String]) -> Vec<Message> {
    vec![
        Message::system(OMISSION_SYSTEM),
        Message::user(format!(
            "Question:\n{}\n\nContext:\n{}\n\nClaims:\n{}\n\nAnswer:",
            question.trim(),
            document.trim_end(),
            if claims.is_empty() {
                "(none)".to_string()
            } else {
                numbered(claims)
            }
        )),
    ]
}

fn numbered(claims: &[String]) -> String {
    claims
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
