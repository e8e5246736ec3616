//! Stdio transport: one JSON-RPC message per line on a child process's
//! stdin/stdout. Standard error is forwarded to the host log.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, Mutex};

use crate::error::TransportError;
use crate::jsonrpc::{self, IdGenerator, ToolDescriptor};
use crate::reader::MessageReader;
use crate::Transport;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, TransportError>>>>>;

struct Running {
    child: Child,
    stdin: tokio::process::ChildStdin,
    pending: PendingMap,
    reader_task: tokio::task::JoinHandle<()>,
}

/// A subprocess-backed MCP server connection.
///
/// `start` spawns `command args...` with piped stdin/stdout and a
/// background task that demultiplexes responses by JSON-RPC id onto
/// per-request oneshot channels; the process's stderr is inherited so
/// it reaches the host's own stderr/log stream. At most one request is
/// outstanding on the wire at a time from the executor's perspective,
/// but the plumbing itself supports arbitrary concurrent callers.
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    ids: IdGenerator,
    state: Mutex<Option<Running>>,
}

impl StdioTransport {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self { command: command.into(), args, ids: IdGenerator::default(), state: Mutex::new(None) }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        self.start().await?;

        let id = self.ids.next();
        let (tx, rx) = oneshot::channel();

        {
            let guard = self.state.lock().await;
            let running = guard
                .as_ref()
                .ok_or_else(|| TransportError::Unavailable("stdio transport not started".into()))?;
            running.pending.lock().await.insert(id, tx);

            let mut line = jsonrpc::build_request(id, method, params).to_string();
            line.push('\n');

            let mut stdin = &running.stdin;
            stdin.write_all(line.as_bytes()).await?;
            stdin.flush().await?;
        }

        rx.await.map_err(|_| TransportError::Unavailable("subprocess closed the response channel".into()))?
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn start(&self) -> Result<(), TransportError> {
        let mut guard = self.state.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| TransportError::Unavailable(format!("failed to spawn {}: {e}", self.command)))?;

        let stdin = child.stdin.take().ok_or_else(|| TransportError::Unavailable("no stdin".into()))?;
        let stdout = child.stdout.take().ok_or_else(|| TransportError::Unavailable("no stdout".into()))?;
        let stderr = child.stderr.take();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let pending_for_reader = pending.clone();
        let server_name = self.command.clone();

        let reader_task = tokio::spawn(async move {
            let mut stream = Box::pin(MessageReader::new(stdout));
            while let Some(item) = stream.next().await {
                match item {
                    Ok(msg) => {
                        let Some(id) = jsonrpc::response_id(&msg) else {
                            tracing::warn!(server = %server_name, "stdio transport: message with no id, discarding");
                            continue;
                        };
                        let mut map = pending_for_reader.lock().await;
                        if let Some(sender) = map.remove(&id) {
                            let _ = sender.send(jsonrpc::extract_result(msg));
                        } else {
                            tracing::warn!(server = %server_name, id, "stdio transport: stray response id, discarding");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(server = %server_name, error = %e, "stdio transport: read error, closing");
                        break;
                    }
                }
            }
        });

        if let Some(stderr) = stderr {
            let server_name = self.command.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::info!(server = %server_name, "{line}");
                }
            });
        }

        *guard = Some(Running { child, stdin, pending, reader_task });
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, TransportError> {
        let result = self.request("list_tools", Value::Object(Default::default())).await?;
        jsonrpc::parse_tool_list(result)
    }

    async fn execute_tool(&self, tool_name: &str, input: Value) -> Result<Value, TransportError> {
        let params = serde_json::json!({ "name": tool_name, "arguments": input });
        self.request("call_tool", params).await
    }

    async fn is_alive(&self) -> bool {
        let mut guard = self.state.lock().await;
        match guard.as_mut() {
            Some(running) => matches!(running.child.try_wait(), Ok(None)),
            None => false,
        }
    }

    async fn stop(&self) -> Result<(), TransportError> {
        let mut guard = self.state.lock().await;
        let Some(mut running) = guard.take() else {
            return Ok(());
        };
        running.reader_task.abort();
        let _ = running.child.start_kill();
        let _ = running.child.wait().await;
        Ok(())
    }
}
