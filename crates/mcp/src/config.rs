//! The static MCP server registry: `mcp_servers.json`.
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "clock": { "command": "clock-server", "args": ["--utc"] },
//!     "search": { "command": "https://tools.example.com/mcp", "transport": "sse", "enabled": false }
//!   }
//! }
//! ```
//!
//! `command` doubles as the transport-specific endpoint: an executable
//! for `stdio`, a URL for `http-stream` and `sse`. This keeps the
//! schema uniform across transport kinds instead of growing a
//! transport-specific field for each one.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One of the three transport kinds a server may be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum McpTransportKind {
    Stdio,
    HttpStream,
    Sse,
}

impl Default for McpTransportKind {
    fn default() -> Self {
        McpTransportKind::Stdio
    }
}

fn default_enabled() -> bool {
    true
}

/// One server entry in the registry file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerEntry {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub transport: McpTransportKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Known tool names. `None` means: discover via `list_tools()` on
    /// first use instead of trusting a static list.
    #[serde(default)]
    pub tools: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(rename = "mcpServers")]
    mcp_servers: HashMap<String, McpServerEntry>,
}

/// Errors raised while reading or querying the registry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum McpConfigError {
    #[error("mcp config file not found at {0}")]
    Missing(String),
    #[error("mcp config file malformed: {0}")]
    Malformed(String),
    #[error("unknown mcp server {0:?}")]
    UnknownServer(String),
}

impl McpConfigError {
    pub fn kind(&self) -> agentic_types::ErrorKind {
        match self {
            McpConfigError::Missing(_) => agentic_types::ErrorKind::ConfigMissing,
            McpConfigError::Malformed(_) => agentic_types::ErrorKind::ConfigMalformed,
            McpConfigError::UnknownServer(_) => agentic_types::ErrorKind::ToolNotFound,
        }
    }
}

/// A parsed, queryable `mcp_servers.json`.
#[derive(Debug, Clone)]
pub struct McpConfig {
    servers: HashMap<String, McpServerEntry>,
}

impl McpConfig {
    /// Read and parse the registry file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, McpConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|_| McpConfigError::Missing(path.display().to_string()))?;
        Self::parse(&raw)
    }

    /// Parse an already-read registry document.
    pub fn parse(raw: &str) -> Result<Self, McpConfigError> {
        let file: RegistryFile =
            serde_json::from_str(raw).map_err(|e| McpConfigError::Malformed(e.to_string()))?;
        Ok(Self { servers: file.mcp_servers })
    }

    /// Every server whose `enabled` flag is true (the default).
    pub fn get_enabled_servers(&self) -> Vec<(&str, &McpServerEntry)> {
        self.servers
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(name, entry)| (name.as_str(), entry))
            .collect()
    }

    pub fn is_server_enabled(&self, name: &str) -> bool {
        self.servers.get(name).map(|e| e.enabled).unwrap_or(false)
    }

    pub fn get_server_metadata(&self, name: &str) -> Result<&McpServerEntry, McpConfigError> {
        self.servers.get(name).ok_or_else(|| McpConfigError::UnknownServer(name.to_string()))
    }

    pub fn server_names(&self) -> impl Iterator<Item = &str> {
        self.servers.keys().map(|s| s.as_str())
    }
}
