//! One query in, one answer out, with at most one tool call in between.

pub mod extract;

use std::sync::Arc;

use serde_json::Map;
use tracing::{debug, info, warn};

use crate::llm::Oracle;
use crate::mcp::{ToolHost, ToolInvocationRequest, ToolResult};
use crate::toolset::{Toolset, has_help_intent};
use crate::utils::preview;

pub use extract::{ExtractedCall, extract_tool_call, tool_call_span};

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Help intent answered by the help tool; the oracle was never asked.
    HelpShortcut,
    /// The completion had no tool call and is the answer as-is.
    DirectAnswer,
    /// A tool call was attempted but could not be parsed.
    ParseFailure,
    /// A tool ran and the oracle narrated its result.
    ToolAnswer,
    /// A tool ran but narration failed; the raw result is the answer.
    NarrationFailed,
}

#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub query: String,
    pub raw_completion: String,
    pub invocation: Option<ToolInvocationRequest>,
    pub result: Option<ToolResult>,
    pub final_text: String,
    pub outcome: TurnOutcome,
}

impl ConversationTurn {
    fn new(query: &str, outcome: TurnOutcome, final_text: String) -> Self {
        Self {
            query: query.to_string(),
            raw_completion: String::new(),
            invocation: None,
            result: None,
            final_text,
            outcome,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to list tools: {0:#}")]
    Tools(anyhow::Error),
    #[error("model request failed: {0:#}")]
    Oracle(anyhow::Error),
    #[error("the tool server is no longer running")]
    Disconnected,
}

pub struct DispatchLoop {
    host: Arc<dyn ToolHost>,
    oracle: Arc<dyn Oracle>,
    toolset: Box<dyn Toolset>,
}

impl DispatchLoop {
    pub fn new(host: Arc<dyn ToolHost>, oracle: Arc<dyn Oracle>, toolset: Box<dyn Toolset>) -> Self {
        Self {
            host,
            oracle,
            toolset,
        }
    }

    pub fn toolset(&self) -> &dyn Toolset {
        self.toolset.as_ref()
    }

    pub async fn run_turn(&self, query: &str) -> Result<ConversationTurn, DispatchError> {
        if !self.host.is_connected() {
            return Err(DispatchError::Disconnected);
        }
        let tools = self.host.list_tools().await.map_err(DispatchError::Tools)?;

        let help_tool = self
            .toolset
            .help_tool()
            .filter(|help| tools.iter().any(|t| t.name == *help));
        if let Some(help) = help_tool.filter(|_| has_help_intent(query, self.toolset.help_keywords())) {
            info!(tool = help, "help shortcut");
            let result = self.host.call_tool(help, Map::new()).await;
            let text = match &result {
                ToolResult::Success { .. } => result.text(),
                ToolResult::Failure { message } => {
                    warn!(%message, "help tool failed");
                    self.toolset.help_fallback().to_string()
                }
            };
            let mut turn = ConversationTurn::new(query, TurnOutcome::HelpShortcut, text);
            turn.invocation = Some(ToolInvocationRequest {
                name: help.to_string(),
                arguments: Map::new(),
            });
            turn.result = Some(result);
            return Ok(turn);
        }

        let config = self.toolset.generation_config();
        let prompt = self.toolset.grounding_prompt(&tools, query);
        let completion = self
            .oracle
            .complete(&prompt, &config)
            .await
            .map_err(DispatchError::Oracle)?;
        debug!(completion = %preview(&completion, 100), "oracle replied");

        let call = match extract_tool_call(&completion) {
            ExtractedCall::None => {
                let mut turn = ConversationTurn::new(query, TurnOutcome::DirectAnswer, completion.clone());
                turn.raw_completion = completion;
                return Ok(turn);
            }
            ExtractedCall::Malformed { reason } => {
                warn!(%reason, "could not parse tool call");
                let text = self.toolset.parse_failure_note(&completion);
                let mut turn = ConversationTurn::new(query, TurnOutcome::ParseFailure, text);
                turn.raw_completion = completion;
                return Ok(turn);
            }
            ExtractedCall::Call(call) => call,
        };

        info!(tool = %call.name, "invoking tool");
        let result = self.host.call_tool(&call.name, call.arguments.clone()).await;
        if let ToolResult::Failure { message } = &result {
            debug!(tool = %call.name, %message, "tool failed");
        }

        let narration = self.toolset.narration_prompt(query, &call, &result);
        let (outcome, final_text) = match self.oracle.complete(&narration, &config).await {
            Ok(text) => (
                TurnOutcome::ToolAnswer,
                format!("{}\n\n{}", self.toolset.result_heading(), text),
            ),
            Err(e) => {
                warn!(error = %e, "narration failed, returning raw result");
                let raw = match &result {
                    ToolResult::Success { .. } => result.text(),
                    ToolResult::Failure { message } => format!("Error: {message}"),
                };
                (
                    TurnOutcome::NarrationFailed,
                    format!("⚠️ Could not summarize the result ({e:#}). Raw tool output:\n\n{raw}"),
                )
            }
        };

        Ok(ConversationTurn {
            query: query.to_string(),
            raw_completion: completion,
            invocation: Some(call),
            result: Some(result),
            final_text,
            outcome,
        })
    }
}
