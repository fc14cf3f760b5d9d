use anyhow::Result;
use serde_json::{Map, Value};

use crate::mcp::{ToolDescriptor, ToolResult};

/// The tool-side contract the dispatch loop depends on.
///
/// Implemented by the in-process [`ToolRegistry`](crate::registry::ToolRegistry)
/// and by a remote [`McpServer`](crate::mcp::McpServer) reached over stdio.
#[async_trait::async_trait]
pub trait ToolHost: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Never fails: lookup misses, tool errors and transport trouble all come
    /// back as [`ToolResult::Failure`].
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ToolResult;

    /// False once the host can no longer answer, e.g. its process exited.
    fn is_connected(&self) -> bool {
        true
    }
}
