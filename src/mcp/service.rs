use std::sync::Arc;

use anyhow::Result;
use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::mcp::PROTOCOL_VERSION;
use crate::mcp::jsonrpc::{self, RpcMessage, RpcRequest};
use crate::registry::ToolRegistry;

/// Serves a [`ToolRegistry`] as an MCP server over a line-oriented stream.
///
/// Requests are handled strictly one at a time, in arrival order.
pub struct McpService {
    name: String,
    version: String,
    instructions: Option<String>,
    registry: Arc<ToolRegistry>,
}

impl McpService {
    pub fn new(name: impl Into<String>, version: impl Into<String>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            instructions: None,
            registry,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Runs until the reader reaches end of stream.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = %self.name, tools = self.registry.len(), "serving");
        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(reply) = self.handle_line(&line).await {
                let mut s = serde_json::to_string(&reply)?;
                s.push('\n');
                writer.write_all(s.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        info!(server = %self.name, "client disconnected");
        Ok(())
    }

    pub async fn handle_line(&self, line: &str) -> Option<RpcMessage> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparsable request line");
                return Some(jsonrpc::err(Value::Null, jsonrpc::PARSE_ERROR, format!("Parse error: {e}")));
            }
        };
        match serde_json::from_value::<RpcMessage>(value) {
            Ok(RpcMessage::Req(req)) => self.handle_request(req).await,
            Ok(other) => {
                debug!(?other, "ignoring response sent to server");
                None
            }
            Err(e) => Some(jsonrpc::err(
                Value::Null,
                jsonrpc::INVALID_REQUEST,
                format!("Invalid request: {e}"),
            )),
        }
    }

    pub async fn handle_request(&self, req: RpcRequest) -> Option<RpcMessage> {
        debug!(method = %req.method, id = %req.id, "request");
        if req.is_notification() {
            return None;
        }
        let id = req.id.clone();
        let reply = match req.method.as_str() {
            "initialize" => jsonrpc::ok(id, self.initialize_result()),
            "ping" => jsonrpc::ok(id, json!({})),
            "tools/list" => {
                let tools: Vec<_> = self
                    .registry
                    .list_tools()
                    .iter()
                    .map(|t| t.to_wire())
                    .collect();
                jsonrpc::ok(id, json!({ "tools": tools }))
            }
            "tools/call" => {
                let params = req.params.unwrap_or(Value::Null);
                let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
                    return Some(jsonrpc::err(id, jsonrpc::INVALID_PARAMS, "tools/call requires a tool name"));
                };
                let arguments = match params.get("arguments") {
                    None | Some(Value::Null) => Map::new(),
                    Some(Value::Object(m)) => m.clone(),
                    Some(_) => {
                        return Some(jsonrpc::err(
                            id,
                            jsonrpc::INVALID_PARAMS,
                            "tools/call arguments must be an object",
                        ));
                    }
                };
                let result = self.registry.invoke(name, arguments).await;
                match serde_json::to_value(result.to_wire()) {
                    Ok(v) => jsonrpc::ok(id, v),
                    Err(e) => jsonrpc::err(id, jsonrpc::INTERNAL_ERROR, e.to_string()),
                }
            }
            other => jsonrpc::err(id, jsonrpc::METHOD_NOT_FOUND, format!("Method not found: {other}")),
        };
        Some(reply)
    }

    fn initialize_result(&self) -> Value {
        let mut result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": self.name, "version": self.version },
        });
        if let Some(i) = &self.instructions {
            result["instructions"] = json!(i);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::{ParamSpec, ParamType, ToolDescriptor};
    use crate::registry::Arguments;

    fn service() -> McpService {
        let mut r = ToolRegistry::new();
        r.register(
            ToolDescriptor::new("echo", "Echo the text back")
                .param(ParamSpec::required("text", ParamType::String)),
            |args: Arguments| async move { anyhow::Ok(json!(args.string("text")?)) },
        )
        .unwrap();
        McpService::new("test", "0.0.1", Arc::new(r))
    }

    fn result_of(reply: Option<RpcMessage>) -> Value {
        match reply {
            Some(RpcMessage::Ok(ok)) => ok.result,
            other => panic!("expected success, got {other:?}"),
        }
    }

    fn error_code(reply: Option<RpcMessage>) -> i64 {
        match reply {
            Some(RpcMessage::Err(e)) => e.error.code,
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let r = service()
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await;
        let result = result_of(r);
        assert_eq!(result["serverInfo"]["name"], "test");
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let r = service()
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(r.is_none());
    }

    #[tokio::test]
    async fn tools_call_wraps_text_content() {
        let r = service()
            .handle_line(
                r#"{"jsonrpc":"2.0","id":"x","method":"tools/call","params":{"name":"echo","arguments":{"text":"hi"}}}"#,
            )
            .await;
        let result = result_of(r);
        assert_eq!(result["content"][0]["text"], "hi");
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result_not_an_rpc_error() {
        let r = service()
            .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"nope"}}"#)
            .await;
        let result = result_of(r);
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn protocol_errors_use_standard_codes() {
        let s = service();
        assert_eq!(error_code(s.handle_line("{not json").await), jsonrpc::PARSE_ERROR);
        assert_eq!(
            error_code(s.handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#).await),
            jsonrpc::METHOD_NOT_FOUND
        );
        assert_eq!(
            error_code(s.handle_line(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{}}"#).await),
            jsonrpc::INVALID_PARAMS
        );
    }
}
