use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::mcp::jsonrpc::{self, RpcMessage};
use crate::mcp::transport::{InboundLine, LineTransport};
use crate::mcp::{CallToolResult, McpTool, PROTOCOL_VERSION, ToolDescriptor, ToolHost, ToolResult};

type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<RpcMessage>>>>;

/// How to launch a tool server process.
#[derive(Debug, Clone)]
pub struct ServerSpec {
    pub id: String,
    pub cmd: String,
    pub args: Vec<String>,
}

impl ServerSpec {
    /// Picks an interpreter from the file extension: `.py` runs under
    /// `python3`, `.js` under `node`, anything else is executed directly.
    pub fn for_path(path: impl AsRef<Path>, extra_args: Vec<String>) -> Self {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| shown.clone());
        let (cmd, mut args) = match path.extension().and_then(|e| e.to_str()) {
            Some("py") => ("python3".to_string(), vec![shown]),
            Some("js") => ("node".to_string(), vec![shown]),
            _ => (shown.clone(), vec![]),
        };
        args.extend(extra_args);
        Self { id, cmd, args }
    }
}

/// Child command for `spec`. On unix the child gets its own process group,
/// so a terminal Ctrl-C reaches only the agent.
fn command(spec: &ServerSpec) -> Command {
    let mut cmd = Command::new(&spec.cmd);
    cmd.args(&spec.args)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub instructions: Option<String>,
}

/// Client-side handle on one MCP server reached over a line transport.
pub struct McpServer {
    pub spec: ServerSpec,
    pub info: ServerInfo,
    transport: AsyncMutex<LineTransport>,
    pending: Pending,
    closed: Arc<AtomicBool>,
    child: Mutex<Option<Child>>,
}

impl McpServer {
    pub async fn spawn(spec: ServerSpec, startup_timeout: Duration) -> Result<Self> {
        let mut child = command(&spec)
            .spawn()
            .with_context(|| format!("spawning {} ({})", spec.id, spec.cmd))?;

        let stdout = child.stdout.take().ok_or_else(|| anyhow!("no stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| anyhow!("no stderr"))?;
        let stdin = child.stdin.take().ok_or_else(|| anyhow!("no stdin"))?;

        let transport = LineTransport::with_stderr(stdout, stdin, Some(stderr));
        let mut server = Self::start(spec, transport);
        *server.child.get_mut() = Some(child);
        server.handshake(startup_timeout).await?;
        Ok(server)
    }

    /// Speaks to a server over already-connected streams.
    pub async fn connect<R, W>(
        spec: ServerSpec,
        reader: R,
        writer: W,
        startup_timeout: Duration,
    ) -> Result<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let mut server = Self::start(spec, LineTransport::new(reader, writer));
        server.handshake(startup_timeout).await?;
        Ok(server)
    }

    fn start(spec: ServerSpec, mut transport: LineTransport) -> Self {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        if let Some(rx) = transport.rx_lines.take() {
            Self::start_reader(spec.id.clone(), rx, pending.clone(), closed.clone());
        }
        Self {
            spec,
            info: ServerInfo::default(),
            transport: AsyncMutex::new(transport),
            pending,
            closed,
            child: Mutex::new(None),
        }
    }

    fn start_reader(
        id: String,
        mut rx: tokio::sync::mpsc::UnboundedReceiver<InboundLine>,
        pending: Pending,
        closed: Arc<AtomicBool>,
    ) {
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                match line {
                    InboundLine::Stdout(s) => {
                        if let Ok(msg) = serde_json::from_str::<RpcMessage>(&s) {
                            // Route by id to pending waiter (if any)
                            let key = msg.id().to_string();
                            if let Some(tx) = pending.lock().remove(&key) {
                                let _ = tx.send(msg);
                            } else {
                                debug!(server = %id, line = %s, "unsolicited message");
                            }
                        } else {
                            debug!(server = %id, line = %s, "server stdout (non-json)");
                        }
                    }
                    InboundLine::Stderr(s) => {
                        debug!(server = %id, line = %s, "server stderr");
                    }
                }
            }
            // Stream closed: fail every outstanding call.
            closed.store(true, Ordering::SeqCst);
            let dropped = pending.lock().drain().count();
            if dropped > 0 {
                warn!(server = %id, dropped, "server closed with requests in flight");
            }
        });
    }

    async fn handshake(&mut self, startup_timeout: Duration) -> Result<()> {
        let init = timeout(startup_timeout, self.initialize())
            .await
            .context("timeout waiting initialize")??;
        self.info = ServerInfo {
            name: init
                .pointer("/serverInfo/name")
                .and_then(|v| v.as_str())
                .unwrap_or(&self.spec.id)
                .to_string(),
            version: init
                .pointer("/serverInfo/version")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            instructions: init
                .get("instructions")
                .and_then(|v| v.as_str())
                .map(String::from),
        };
        self.notify("notifications/initialized", None).await?;
        Ok(())
    }

    async fn initialize(&self) -> Result<Value> {
        self.rpc_call(
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )
        .await
    }

    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let n = jsonrpc::notification(method, params);
        self.transport.lock().await.send_json(&n).await
    }

    pub async fn rpc_call(&self, method: &str, params: Value) -> Result<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(anyhow!("rpc {method} failed: server {} is no longer running", self.spec.id));
        }
        let id = Value::String(Uuid::new_v4().to_string());
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id.to_string(), tx);

        let req = jsonrpc::req(method, id.clone(), if params.is_null() { None } else { Some(params) });
        if let Err(e) = self.transport.lock().await.send_json(&req).await {
            self.pending.lock().remove(&id.to_string());
            return Err(e);
        }

        let msg = rx
            .await
            .map_err(|_| anyhow!("rpc {} failed: server closed the connection", method))?;

        match msg {
            RpcMessage::Ok(ok) => Ok(ok.result),
            RpcMessage::Err(e) => Err(anyhow!(
                "rpc error {}: {} {:?}",
                method,
                e.error.message,
                e.error.data
            )),
            RpcMessage::Req(_r) => Err(anyhow!("unexpected request from server during call")),
        }
    }

    pub async fn fetch_tools(&self) -> Result<Vec<McpTool>> {
        let result = self.rpc_call("tools/list", json!({})).await?;
        let tools = result.get("tools").cloned().unwrap_or_else(|| json!([]));
        serde_json::from_value(tools).context("decoding tools/list result")
    }

    pub async fn shutdown(&self) -> Result<()> {
        let _ = self.transport.lock().await.close().await;
        let child = self.child.lock().take();
        if let Some(mut child) = child {
            child.kill().await.context("stopping server process")?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ToolHost for McpServer {
    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let tools = self.fetch_tools().await?;
        Ok(tools.iter().map(ToolDescriptor::from_wire).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ToolResult {
        let params = json!({
            "name": name,
            "arguments": arguments,
        });
        let result = match self.rpc_call("tools/call", params).await {
            Ok(v) => v,
            Err(e) => return ToolResult::failure(format!("{e:#}")),
        };
        match serde_json::from_value::<CallToolResult>(result) {
            Ok(r) => ToolResult::from_wire(r),
            Err(e) => ToolResult::failure(format!("malformed tools/call result: {e}")),
        }
    }
}
