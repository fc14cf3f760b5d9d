//! Per-domain prompt profiles.
//!
//! A toolset decides how the model is grounded for one kind of tool server:
//! its persona, example invocations, domain rules, which tool answers help
//! requests and how tool results are narrated back.

use clap::ValueEnum;
use serde_json::{Value, json};

use crate::llm::GenerationConfig;
use crate::mcp::{ToolDescriptor, ToolInvocationRequest, ToolResult};
use crate::utils::{render_arguments, render_tool_listing};

pub mod calculator;
pub mod cloud;
pub mod linux;
pub mod weather;

pub const DEFAULT_HELP_KEYWORDS: &[&str] = &[
    "help", "example", "examples", "what can", "how to", "commands", "options",
];

/// One example line in the grounding prompt.
pub struct Example {
    pub label: &'static str,
    pub tool: &'static str,
    pub arguments: Value,
}

impl Example {
    pub fn new(label: &'static str, tool: &'static str, arguments: Value) -> Self {
        Self {
            label,
            tool,
            arguments,
        }
    }

    fn render(&self) -> String {
        let call = json!({ "tool_call": { "name": self.tool, "arguments": self.arguments } });
        format!("- {}: {}", self.label, call)
    }
}

pub trait Toolset: Send + Sync {
    fn name(&self) -> &'static str;

    /// Opening line of the grounding prompt, up to the tool listing.
    fn intro(&self) -> &'static str;

    fn examples(&self) -> Vec<Example>;

    /// Domain rules appended after the examples.
    fn rules(&self) -> &'static str;

    /// Icon + label placed before the user's query.
    fn query_label(&self) -> &'static str {
        "💬 User query"
    }

    fn repl_prompt(&self) -> &'static str {
        "Query: "
    }

    fn banner(&self) -> &'static str {
        "MCP Client Started!"
    }

    fn tips(&self) -> Vec<&'static str> {
        vec!["Type 'quit' to exit"]
    }

    fn help_tool(&self) -> Option<&'static str> {
        None
    }

    fn help_keywords(&self) -> &'static [&'static str] {
        DEFAULT_HELP_KEYWORDS
    }

    /// Returned when the help tool exists but fails.
    fn help_fallback(&self) -> &'static str {
        "I can help you with the tools this server provides. Ask a question in plain language."
    }

    fn max_listed_tools(&self) -> Option<usize> {
        None
    }

    fn show_parameters(&self) -> bool {
        true
    }

    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::default()
    }

    fn result_heading(&self) -> &'static str {
        "🔧 Tool Result:"
    }

    /// Used in the parse-failure note, e.g. "a calculator tool".
    fn tool_noun(&self) -> &'static str {
        "a tool"
    }

    fn parse_failure_note(&self, raw: &str) -> String {
        format!(
            "I attempted to use {} but encountered a parsing issue. Here's what I received: {raw}",
            self.tool_noun()
        )
    }

    /// Title, tool label and data label of the narration prompt.
    fn narration_labels(&self) -> (&'static str, &'static str, &'static str) {
        ("🔧 TOOL RESULT ANALYSIS", "Tool Used", "📊 DATA RECEIVED:")
    }

    fn narration_instructions(&self) -> &'static str {
        "Provide a clear, well-formatted response that:
1. Directly answers the user's question
2. Highlights the most important information
3. Explains any errors or limitations in plain language

Please provide your answer now:"
    }

    fn grounding_prompt(&self, tools: &[ToolDescriptor], query: &str) -> String {
        let listing = render_tool_listing(tools, self.max_listed_tools(), self.show_parameters());
        let examples = self
            .examples()
            .iter()
            .map(Example::render)
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "{intro}

{listing}

🔍 TOOL USAGE INSTRUCTIONS:
When you need to use a tool, respond with ONLY a clean JSON object in this format:
{{\"tool_call\": {{\"name\": \"tool_name\", \"arguments\": {{\"param1\": \"value1\", \"param2\": \"value2\"}}}}}}

📋 EXAMPLES:
{examples}

{rules}

{label}: {query}",
            intro = self.intro(),
            rules = self.rules(),
            label = self.query_label(),
        )
    }

    fn narration_prompt(&self, query: &str, call: &ToolInvocationRequest, result: &ToolResult) -> String {
        let (title, tool_label, data_label) = self.narration_labels();
        let data = match result {
            ToolResult::Success { .. } => result.text(),
            ToolResult::Failure { message } => format!("ERROR: {message}"),
        };
        format!(
            "{title}

User Query: \"{query}\"
{tool_label}: {name}
Tool Arguments: {args}

{data_label}
{data}

🎯 INSTRUCTIONS:
{instructions}",
            name = call.name,
            args = render_arguments(&call.arguments),
            instructions = self.narration_instructions(),
        )
    }
}

/// Toolset for servers we know nothing about.
pub struct Generic;

impl Toolset for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn intro(&self) -> &'static str {
        "You are a helpful assistant with access to these tools:"
    }

    fn examples(&self) -> Vec<Example> {
        vec![Example::new("No arguments", "tool_name", json!({}))]
    }

    fn rules(&self) -> &'static str {
        "🎯 Only call a tool when it helps answer the question; otherwise answer directly."
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToolsetKind {
    Auto,
    Generic,
    Calculator,
    Linux,
    Weather,
    Aws,
    Gcp,
}

impl ToolsetKind {
    /// Guesses the domain from the tools a server offers.
    pub fn detect(tools: &[ToolDescriptor]) -> Self {
        let has = |name: &str| tools.iter().any(|t| t.name == name);
        if has("get_aws_help") || has("list_ec2_instances") {
            ToolsetKind::Aws
        } else if has("get_gcp_help") || has("list_compute_instances") {
            ToolsetKind::Gcp
        } else if has("add") && has("divide") {
            ToolsetKind::Calculator
        } else if has("get_forecast") || has("get_alerts") {
            ToolsetKind::Weather
        } else if has("get_cpu_usage") || has("list_processes") {
            ToolsetKind::Linux
        } else {
            ToolsetKind::Generic
        }
    }

    pub fn build(self, tools: &[ToolDescriptor]) -> Box<dyn Toolset> {
        match self {
            ToolsetKind::Auto => Self::detect(tools).build(tools),
            ToolsetKind::Generic => Box::new(Generic),
            ToolsetKind::Calculator => Box::new(calculator::Calculator),
            ToolsetKind::Linux => Box::new(linux::Linux),
            ToolsetKind::Weather => Box::new(weather::Weather),
            ToolsetKind::Aws => Box::new(cloud::Aws),
            ToolsetKind::Gcp => Box::new(cloud::Gcp),
        }
    }
}

/// Whole-word match of the query against help phrases, so that "helpful" or
/// "queryset" do not trigger the help shortcut.
pub fn has_help_intent(query: &str, keywords: &[&str]) -> bool {
    let words: Vec<String> = query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect();
    keywords.iter().any(|k| {
        let phrase: Vec<&str> = k.split_whitespace().collect();
        !phrase.is_empty() && words.windows(phrase.len()).any(|w| w.iter().map(String::as_str).eq(phrase.iter().copied()))
    })
}
