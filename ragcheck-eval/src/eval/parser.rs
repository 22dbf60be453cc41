//! Response parsing: recover a typed payload from a model reply.
//!
//! Judges are asked for JSON but often wrap it in a markdown code fence,
//! sometimes after a line of prose. Parsing is two explicit steps:
//! [`strip_fence`] isolates the payload text, then [`decode`] maps it onto
//! the stage's schema. Either step failing is a hard error for the stage.

use crate::error::ParseError;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

const FENCE: &str = "```";

/// Isolate the payload of a possibly fenced reply.
///
/// - An opening fence (with an optional language tag such as `json`) must
///   be matched by a closing fence; the payload is what lies between. Both
///   fences may sit on the same line.
/// - Prose before the opening fence and after the closing fence is dropped.
/// - A lone trailing fence with no opening fence is dropped.
pub fn strip_fence(raw: &str) -> Result<&str, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let open = if trimmed.starts_with(FENCE) {
        Some(0)
    } else if trimmed.matches(FENCE).count() >= 2 {
        trimmed.find("\n```").map(|i| i + 1)
    } else {
        None
    };

    let payload = match open {
        Some(start) => {
            let after_marker = &trimmed[start + FENCE.len()..];
            match after_marker.find('\n') {
                // The rest of the opening line is the language tag.
                Some(i) => {
                    let body = &after_marker[i + 1..];
                    let close = body.rfind(FENCE).ok_or(ParseError::UnterminatedFence)?;
                    &body[..close]
                }
                // Fence opened and closed on one line: ```json {...} ```
                None => {
                    let close = after_marker
                        .rfind(FENCE)
                        .ok_or(ParseError::UnterminatedFence)?;
                    after_marker[..close].trim_start_matches(|c: char| c.is_ascii_alphanumeric())
                }
            }
        }
        None => trimmed.strip_suffix(FENCE).unwrap_or(trimmed),
    };

    let payload = payload.trim();
    if payload.is_empty() {
        Err(ParseError::Empty)
    } else {
        Ok(payload)
    }
}

/// Decode a payload into `T`.
///
/// Malformed or truncated JSON is [`ParseError::InvalidJson`]; well-formed
/// JSON of the wrong shape is [`ParseError::Schema`].
pub fn decode<T: DeserializeOwned>(payload: &str) -> Result<T, ParseError> {
    serde_json::from_str(payload).map_err(|e| match e.classify() {
        Category::Data => ParseError::Schema(e),
        Category::Syntax | Category::Eof | Category::Io => ParseError::InvalidJson(e),
    })
}

/// Strip any fence from `raw` and decode the payload into `T`.
pub fn parse_response<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let payload = strip_fence(raw)?;
    decode(payload)
}
