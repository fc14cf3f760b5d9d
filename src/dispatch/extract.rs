//! Locating a tool call embedded in free model text.
//!
//! The model is asked to answer with
//! `{"tool_call": {"name": "<tool>", "arguments": {...}}}`, but usually wraps
//! it in prose or a code fence. Only the first such object is ever used.

use std::ops::Range;

use serde::Deserialize;
use serde_json::Value;

use crate::mcp::ToolInvocationRequest;

pub const TOOL_CALL_KEY: &str = "\"tool_call\"";

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedCall {
    /// No tool-call marker in the text.
    None,
    /// A marker was found but the object around it is not a valid tool call.
    Malformed { reason: String },
    Call(ToolInvocationRequest),
}

#[derive(Deserialize)]
struct Envelope {
    tool_call: ToolInvocationRequest,
}

/// Byte offset of the `{` that opens the first tool-call object, i.e. the
/// first `"tool_call"` key preceded (modulo whitespace) by an opening brace.
pub fn marker_start(text: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = text[from..].find(TOOL_CALL_KEY) {
        let at = from + rel;
        let before = text[..at].trim_end();
        if before.ends_with('{') {
            return Some(before.len() - 1);
        }
        from = at + TOOL_CALL_KEY.len();
    }
    None
}

/// Span of the first tool-call object, from its opening brace to the matching
/// closing brace. Uses a JSON tokenizer, so braces inside string values do not
/// count. `None` when there is no marker or the object never closes.
pub fn tool_call_span(text: &str) -> Option<Range<usize>> {
    let start = marker_start(text)?;
    let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
    match values.next() {
        Some(Ok(_)) => Some(start..start + values.byte_offset()),
        _ => None,
    }
}

pub fn extract_tool_call(text: &str) -> ExtractedCall {
    let Some(start) = marker_start(text) else {
        return ExtractedCall::None;
    };
    let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
    let value = match values.next() {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            return ExtractedCall::Malformed {
                reason: format!("invalid JSON: {e}"),
            };
        }
        None => {
            return ExtractedCall::Malformed {
                reason: "empty tool call".into(),
            };
        }
    };
    match serde_json::from_value::<Envelope>(value) {
        Ok(env) => ExtractedCall::Call(env.tool_call),
        Err(e) => ExtractedCall::Malformed {
            reason: format!("unexpected tool call shape: {e}"),
        },
    }
}
