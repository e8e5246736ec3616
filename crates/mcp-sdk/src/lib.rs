//! An in-process MCP server builder.
//!
//! Lets tests (and, in principle, an in-process tool server embedded in
//! the host) register named tool handlers and expose the whole thing as
//! an [`agentic_transport::Transport`] — so the executor, config and
//! agent-graph tests can exercise real dispatch logic without spawning
//! a subprocess or opening a socket.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use agentic_transport::{Transport, TransportError};

pub type ToolFuture = Pin<Box<dyn Future<Output = Result<Value, String>> + Send>>;
pub type ToolHandler = Box<dyn Fn(Value) -> ToolFuture + Send + Sync>;

struct RegisteredTool {
    description: Option<String>,
    input_schema: Value,
    handler: ToolHandler,
}

/// An MCP server that lives in the same process as its caller.
///
/// Registration happens up front; `start`/`stop` only flip an alive
/// flag since there is no real connection to establish.
#[derive(Default)]
pub struct InProcessServer {
    tools: RwLock<HashMap<String, RegisteredTool>>,
    alive: std::sync::atomic::AtomicBool,
}

impl InProcessServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a tool under `name`.
    pub async fn register_tool<F, Fut>(&self, name: impl Into<String>, description: Option<String>, input_schema: Value, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        let boxed: ToolHandler = Box::new(move |args| Box::pin(handler(args)));
        self.tools.write().await.insert(
            name.into(),
            RegisteredTool { description, input_schema, handler: boxed },
        );
    }
}

#[async_trait]
impl Transport for InProcessServer {
    async fn start(&self) -> Result<(), TransportError> {
        self.alive.store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<agentic_transport::ToolDescriptor>, TransportError> {
        let tools = self.tools.read().await;
        Ok(tools
            .iter()
            .map(|(name, tool)| agentic_transport::ToolDescriptor {
                name: name.clone(),
                description: tool.description.clone(),
                input_schema: Some(tool.input_schema.clone()),
            })
            .collect())
    }

    async fn execute_tool(&self, tool_name: &str, input: Value) -> Result<Value, TransportError> {
        let fut = {
            let tools = self.tools.read().await;
            let tool = tools
                .get(tool_name)
                .ok_or_else(|| TransportError::ProtocolViolation(format!("unknown tool {tool_name:?}")))?;
            (tool.handler)(input)
        };
        fut.await.map_err(TransportError::RemoteError)
    }

    async fn is_alive(&self) -> bool {
        self.alive.load(std::sync::atomic::Ordering::SeqCst)
    }

    async fn stop(&self) -> Result<(), TransportError> {
        self.alive.store(false, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn registered_tool_is_listed_and_callable() {
        let server = InProcessServer::new();
        server
            .register_tool("add", Some("adds two numbers".into()), json!({"type": "object"}), |args| async move {
                let a = args["a"].as_i64().unwrap_or(0);
                let b = args["b"].as_i64().unwrap_or(0);
                Ok(json!({"sum": a + b}))
            })
            .await;
        server.start().await.unwrap();

        let tools = server.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "add");

        let result = server.execute_tool("add", json!({"a": 2, "b": 3})).await.unwrap();
        assert_eq!(result, json!({"sum": 5}));
    }

    #[tokio::test]
    async fn unknown_tool_is_a_protocol_violation() {
        let server = InProcessServer::new();
        server.start().await.unwrap();
        let err = server.execute_tool("missing", json!({})).await.unwrap_err();
        assert!(matches!(err, TransportError::ProtocolViolation(_)));
    }
}
