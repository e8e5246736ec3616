//! Transport layer: a uniform request/response abstraction over one MCP
//! server connection, realized as stdio, HTTP-stream or SSE.
//!
//! Every variant speaks the same JSON-RPC-style envelope (see
//! [`jsonrpc`]) and exposes the same five operations through the
//! [`Transport`] trait. Callers — the MCP executor, in practice — never
//! need to know which wire format a given server uses.

pub mod error;
pub mod http;
pub mod jsonrpc;
pub mod reader;
pub mod sse;
pub mod stdio;

use async_trait::async_trait;
use serde_json::Value;

pub use error::TransportError;
pub use http::HttpStreamTransport;
pub use jsonrpc::ToolDescriptor;
pub use sse::SseTransport;
pub use stdio::StdioTransport;

/// One connection to one MCP server, regardless of wire format.
///
/// # Lifecycle
///
/// `start` brings the backing endpoint to a usable state and is
/// idempotent — calling it again on an already-started transport is a
/// no-op. `stop` releases every resource the transport holds and is
/// likewise idempotent. Between the two, `list_tools` and
/// `execute_tool` may be called any number of times, from any task;
/// implementations serialize their own internal state as needed.
///
/// # Errors
///
/// Operations fail with one of four kinds, surfaced through
/// [`TransportError`]: the endpoint could not be reached
/// (`transport-unavailable`), the wire contract was violated
/// (`protocol-violation`), the call exceeded its deadline (`timeout`),
/// or the remote server reported a JSON-RPC error (`remote-error`).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Bring the backing endpoint to a usable state. Idempotent.
    async fn start(&self) -> Result<(), TransportError>;

    /// List the tools this server exposes.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, TransportError>;

    /// Invoke `tool_name` with `input` and block for the single matching
    /// response.
    async fn execute_tool(&self, tool_name: &str, input: Value) -> Result<Value, TransportError>;

    /// Whether the transport currently believes its endpoint is healthy.
    async fn is_alive(&self) -> bool;

    /// Release every resource the transport holds. Idempotent.
    async fn stop(&self) -> Result<(), TransportError>;
}
