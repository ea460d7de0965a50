//! MCP client for one stdio server process.
//!
//! The server is spawned as a child process. A single background reader
//! task owns its stdout and
//!
//! 1. **correlates** responses with pending requests through `oneshot`
//!    channels keyed by request id,
//! 2. **answers** server-initiated `ping` requests (anything else gets
//!    `Method not found`),
//! 3. **fails** every pending request when the server exits (EOF).
//!
//! Each client owns a [`CancellationToken`]. [`McpClient::shutdown`]
//! cancels it, so requests still in flight return [`McpError::Cancelled`]
//! instead of waiting for answers that will never come.

use crate::mcp::error::{McpError, Result};
use crate::mcp::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, JsonRpcResponseOut, ListToolsResult,
};
use crate::mcp::transport::{MessageKind, classify_message, encode_frame};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// How long a server gets to exit on its own after stdin is closed.
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// Request id -> waiting caller.
///
/// `std::sync::Mutex` so that [`PendingGuard`] can deregister from `Drop`
/// when a caller's future is dropped (e.g. by a task timeout).
type PendingMap = Arc<std::sync::Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// `None` once stdin has been closed by [`McpClient::shutdown`].
type Writer = Arc<Mutex<Option<BufWriter<ChildStdin>>>>;

/// Command line of an MCP server.
#[derive(Debug, Clone, Default)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl ServerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Shell-style rendering for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Removes a pending entry when the request completes or is abandoned.
struct PendingGuard {
    pending: PendingMap,
    id: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.remove(&self.id);
    }
}

/// Connection to one MCP server process.
pub struct McpClient {
    name: String,

    /// Background reader task handle.
    _reader_handle: JoinHandle<()>,

    /// Request-response correlation (request_id -> oneshot sender).
    pending: PendingMap,

    /// Set by the reader once the server's output is gone.
    closed: Arc<AtomicBool>,

    /// Serialized writes to the server's stdin.
    writer: Writer,

    /// Cancels in-flight requests and stops the reader.
    cancel: CancellationToken,

    /// Server process (also killed on drop).
    child: Mutex<Child>,

    /// Tool names from `tools/list`, filled by [`Self::initialize`].
    tools: std::sync::RwLock<Vec<String>>,
}

impl McpClient {
    /// Spawn the server process and start the reader task.
    ///
    /// No protocol traffic happens yet; call [`Self::initialize`] next.
    pub fn spawn(name: impl Into<String>, command: &ServerCommand) -> Result<Self> {
        let name = name.into();
        debug!("Spawning MCP server '{}': {}", name, command.display());

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Io(std::io::Error::other("Failed to capture stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Io(std::io::Error::other("Failed to capture stdout")))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(Self::forward_stderr(name.clone(), stderr));
        }

        let pending: PendingMap = Arc::new(std::sync::Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let writer = Arc::new(Mutex::new(Some(BufWriter::new(stdin))));
        let cancel = CancellationToken::new();

        let reader_handle = tokio::spawn(Self::reader_loop(
            name.clone(),
            stdout,
            Arc::clone(&pending),
            Arc::clone(&closed),
            Arc::clone(&writer),
            cancel.clone(),
        ));

        Ok(Self {
            name,
            _reader_handle: reader_handle,
            pending,
            closed,
            writer,
            cancel,
            child: Mutex::new(child),
            tools: std::sync::RwLock::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handshake: `initialize`, `notifications/initialized`, `tools/list`.
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let params = serde_json::to_value(InitializeParams::default())?;
        let result = self.request("initialize", Some(params)).await?;
        let init: InitializeResult = serde_json::from_value(result)?;
        self.notify("notifications/initialized").await?;

        let tools = self.list_tools().await?;
        info!(
            "MCP server '{}' ready ({}), tools: [{}]",
            self.name,
            init.server_info
                .as_ref()
                .map(|s| format!("{} {}", s.name, s.version))
                .unwrap_or_else(|| "unnamed".to_string()),
            tools.join(", ")
        );
        *self.tools.write().unwrap_or_else(|e| e.into_inner()) = tools;
        Ok(init)
    }

    /// All tool names, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor
                .as_ref()
                .map(|c| serde_json::json!({ "cursor": c }));
            let result = self.request("tools/list", params).await?;
            let page: ListToolsResult = serde_json::from_value(result)?;
            names.extend(page.tools.into_iter().map(|t| t.name));
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(names)
    }

    /// Tools advertised during the handshake.
    pub fn tools(&self) -> Vec<String> {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Whether the server offers `tool`. Servers that advertised nothing
    /// are given the benefit of the doubt.
    pub fn has_tool(&self, tool: &str) -> bool {
        let tools = self.tools.read().unwrap_or_else(|e| e.into_inner());
        tools.is_empty() || tools.iter().any(|t| t == tool)
    }

    /// Invoke a tool. A result flagged `isError` becomes [`McpError::ToolError`].
    pub async fn call_tool(&self, tool: &str, arguments: Value) -> Result<CallToolResult> {
        let params = serde_json::to_value(CallToolParams {
            name: tool.to_string(),
            arguments,
        })?;
        let result = self.request("tools/call", Some(params)).await?;
        let result: CallToolResult = serde_json::from_value(result)?;
        if result.is_error {
            let message = result.joined_text();
            return Err(McpError::ToolError {
                tool: tool.to_string(),
                message: if message.is_empty() {
                    "no details".to_string()
                } else {
                    message
                },
            });
        }
        Ok(result)
    }

    /// Send a request and wait for the correlated response.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let request = JsonRpcRequest::new(method, params);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.insert(request.id, tx);
        }
        let _guard = PendingGuard {
            pending: Arc::clone(&self.pending),
            id: request.id,
        };
        if self.closed.load(Ordering::SeqCst) {
            return Err(McpError::TransportClosed);
        }

        self.send(&request).await?;

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(McpError::Cancelled),
            response = rx => response.map_err(|_| McpError::TransportClosed)?,
        };

        if let Some(error) = response.error {
            return Err(McpError::RpcError {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Send a notification (no response expected).
    pub async fn notify(&self, method: &str) -> Result<()> {
        self.send(&JsonRpcNotification::new(method)).await
    }

    async fn send<T: Serialize>(&self, message: &T) -> Result<()> {
        let frame = encode_frame(message)?;
        trace!("MCP '{}' sending: {}", self.name, frame.trim_end());
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(McpError::Cancelled),
            result = write_frame(&self.writer, &frame) => result,
        }
    }

    /// Cancel in-flight requests, close stdin and reap the process.
    ///
    /// A server that does not exit within a short grace period is killed.
    pub async fn shutdown(&self) -> Result<()> {
        self.cancel.cancel();
        if let Some(mut stdin) = self.writer.lock().await.take()
            && let Err(e) = stdin.shutdown().await
        {
            trace!("MCP '{}' stdin already closed: {}", self.name, e);
        }

        let mut child = self.child.lock().await;
        match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!("MCP server '{}' exited: {}", self.name, status),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                debug!("MCP server '{}' still running, killing it", self.name);
                child.kill().await?;
            }
        }
        Ok(())
    }

    /// Background reader loop. Single owner of the server's stdout.
    async fn reader_loop(
        name: String,
        stdout: ChildStdout,
        pending: PendingMap,
        closed: Arc<AtomicBool>,
        writer: Writer,
        cancel: CancellationToken,
    ) {
        let mut lines = BufReader::new(stdout).lines();

        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };
            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("MCP '{}': server closed its output", name);
                    break;
                }
                Err(e) => {
                    warn!("MCP '{}': read error: {}", name, e);
                    break;
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            trace!("MCP '{}' received: {}", name, line);

            let json: Value = match serde_json::from_str(line) {
                Ok(v) => v,
                Err(_) => {
                    // Some servers print banners on stdout.
                    debug!("MCP '{}': ignoring non-JSON output: {}", name, line);
                    continue;
                }
            };

            match classify_message(&json) {
                MessageKind::Response { id } => {
                    let response: JsonRpcResponse = match serde_json::from_value(json) {
                        Ok(r) => r,
                        Err(e) => {
                            warn!("MCP '{}': failed to parse response: {}", name, e);
                            continue;
                        }
                    };
                    let sender = {
                        let mut pending = pending.lock().unwrap_or_else(|e| e.into_inner());
                        pending.remove(&id)
                    };
                    match sender {
                        Some(tx) => {
                            let _ = tx.send(response);
                        }
                        None => debug!("MCP '{}': no pending receiver for id={}", name, id),
                    }
                }
                MessageKind::IncomingRequest { id, method } => {
                    let reply = if method == "ping" {
                        JsonRpcResponseOut::success(id, serde_json::json!({}))
                    } else {
                        debug!("MCP '{}': rejecting server request '{}'", name, method);
                        JsonRpcResponseOut::method_not_found(id, &method)
                    };
                    let sent = match encode_frame(&reply) {
                        Ok(frame) => write_frame(&writer, &frame).await,
                        Err(e) => Err(e.into()),
                    };
                    if let Err(e) = sent {
                        warn!("MCP '{}': failed to answer '{}': {}", name, method, e);
                    }
                }
                MessageKind::Notification => {
                    trace!(
                        "MCP '{}': notification {}",
                        name,
                        json.get("method").and_then(|m| m.as_str()).unwrap_or("")
                    );
                }
                MessageKind::Unknown => {
                    debug!("MCP '{}': unclassifiable message", name);
                }
            }
        }

        // Reader ended: fail everything still waiting.
        closed.store(true, Ordering::SeqCst);
        let mut pending = pending.lock().unwrap_or_else(|e| e.into_inner());
        if !pending.is_empty() {
            debug!("MCP '{}': failing {} pending request(s)", name, pending.len());
        }
        pending.clear();
    }

    async fn forward_stderr(name: String, stderr: ChildStderr) {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if !line.trim().is_empty() {
                debug!("[{}] {}", name, line.trim_end());
            }
        }
    }
}

async fn write_frame(writer: &Writer, frame: &str) -> Result<()> {
    let mut guard = writer.lock().await;
    let writer = guard.as_mut().ok_or(McpError::TransportClosed)?;
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

impl Drop for McpClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        let _ = self.child.get_mut().start_kill();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_command_display() {
        let command = ServerCommand::new("npx").with_args(["-y", "server-github"]);
        assert_eq!(command.display(), "npx -y server-github");
    }

    #[tokio::test]
    async fn test_incoming_request_rejection_round_trip() {
        // `cat` echoes our request back: the client sees a server request,
        // rejects it, and `cat` echoes the rejection as the response.
        let client = McpClient::spawn("echo", &ServerCommand::new("cat")).unwrap();

        let error = client.request("tools/list", None).await.unwrap_err();
        match error {
            McpError::RpcError { code, message } => {
                assert_eq!(code, -32601);
                assert!(message.contains("tools/list"));
            }
            other => panic!("unexpected error: {other}"),
        }
        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_server_exit_fails_requests() {
        let client = McpClient::spawn("gone", &ServerCommand::new("true")).unwrap();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.request("initialize", None),
        )
        .await
        .expect("request must not hang after the server exits");
        assert!(matches!(
            result,
            Err(McpError::TransportClosed) | Err(McpError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_in_flight_requests() {
        let client = Arc::new(
            McpClient::spawn("silent", &ServerCommand::new("sleep").with_args(["30"])).unwrap(),
        );

        let in_flight = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.request("tools/list", None).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.shutdown().await.unwrap();

        let result = in_flight.await.unwrap();
        assert!(matches!(result, Err(McpError::Cancelled)));
        assert!(client.pending.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_fails() {
        let result = McpClient::spawn(
            "missing",
            &ServerCommand::new("definitely-not-a-real-mcp-server-binary"),
        );
        assert!(matches!(result, Err(McpError::Io(_))));
    }
}
