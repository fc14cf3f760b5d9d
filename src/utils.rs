//! Text rendering helpers shared by the prompts and the REPL.

use serde_json::{Map, Value};

use crate::mcp::ToolDescriptor;

/// Renders the tool listing that grounds the model.
///
/// With `limit`, only the first `limit` tools are shown, followed by a count
/// of the rest. Parameter schemas are included when `with_params` is set.
pub fn render_tool_listing(tools: &[ToolDescriptor], limit: Option<usize>, with_params: bool) -> String {
    let shown = limit.unwrap_or(tools.len()).min(tools.len());
    let mut out = tools[..shown]
        .iter()
        .map(|t| {
            let mut s = format!("🛠️ Tool: {}\n📝 Description: {}\n", t.name, t.description);
            if with_params {
                s.push_str(&format!("⚙️ Parameters: {}\n", render_params(t)));
            }
            s
        })
        .collect::<Vec<_>>()
        .join("\n");
    if tools.len() > shown {
        out.push_str(&format!("\n... and {} more tools available", tools.len() - shown));
    }
    out
}

/// `a: number (required), lines: integer = 50`
pub fn render_params(tool: &ToolDescriptor) -> String {
    if tool.params.is_empty() {
        return "none".into();
    }
    tool.params
        .iter()
        .map(|p| {
            let mut s = format!("{}: {}", p.name, p.ty);
            if p.required {
                s.push_str(" (required)");
            }
            if let Some(d) = &p.default {
                s.push_str(&format!(" = {d}"));
            }
            s
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_arguments(arguments: &Map<String, Value>) -> String {
    Value::Object(arguments.clone()).to_string()
}

/// First `max` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((i, _)) => format!("{}...", &text[..i]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::{ParamSpec, ParamType};
    use serde_json::json;

    fn tools(n: usize) -> Vec<ToolDescriptor> {
        (0..n)
            .map(|i| {
                ToolDescriptor::new(format!("tool_{i}"), format!("does thing {i}"))
                    .param(ParamSpec::optional("lines", ParamType::Integer, json!(50)))
            })
            .collect()
    }

    #[test]
    fn listing_is_truncated_with_a_count() {
        let text = render_tool_listing(&tools(25), Some(20), false);
        assert!(text.contains("tool_19"));
        assert!(!text.contains("tool_20"));
        assert!(text.ends_with("... and 5 more tools available"));
        assert!(!text.contains("Parameters"));
    }

    #[test]
    fn parameters_show_types_and_defaults() {
        let text = render_tool_listing(&tools(1), None, true);
        assert!(text.contains("⚙️ Parameters: lines: integer = 50"), "{text}");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("short", 10), "short");
    }
}
