//! JSON extraction from model replies
//!
//! Models asked for JSON still wrap it in prose or code fences now and then.
//! The first balanced top-level object is extracted with a single pass that
//! tracks brace depth and skips braces inside string literals.

use crate::errors::{PolicyError, Result};
use serde::de::DeserializeOwned;

/// Slice of the first complete `{...}` object in `text`
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' if start.is_some() => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(&text[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Deserialize the first JSON object found in a model reply
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T> {
    let object = extract_json_object(text)
        .ok_or_else(|| PolicyError::AiResponse("No JSON object in reply".to_string()))?;

    serde_json::from_str(object)
        .map_err(|e| PolicyError::AiResponse(format!("Reply JSON does not match schema: {}", e)))
}
