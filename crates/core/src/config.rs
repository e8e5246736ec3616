//! `AgentConfig`: the construction-time parameters for an [`crate::Agent`],
//! assembled once from the environment plus an explicit registry path.

use std::path::PathBuf;

use agentic_types::ApiKey;

const DEFAULT_TRANSITION_LIMIT: u32 = 50;
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Everything an [`crate::Agent`] needs to construct its LLM provider,
/// prompt loader and MCP executor.
#[derive(Clone)]
pub struct AgentConfig {
    pub api_key: ApiKey,
    pub model: String,
    pub soul_path: PathBuf,
    pub agent_path: PathBuf,
    pub mcp_registry_path: PathBuf,
    pub transition_limit: u32,
    /// `LOG_LEVEL`, if set — the base directive for the process's
    /// `tracing` filter. Falls back to `RUST_LOG`, then `"info"`, if
    /// absent.
    pub log_level: Option<String>,
    /// `DEBUG`, parsed as a truthy/falsy flag. When true, raises the
    /// filter to `debug` for the workspace's own crates without
    /// requiring the caller to hand-author an `RUST_LOG` string.
    pub debug: bool,
}

impl AgentConfig {
    /// Read `OPENAI_API_KEY` (required), `AGENTIC_MODEL` (optional, falls
    /// back to a stock default), `LOG_LEVEL` and `DEBUG` (both optional,
    /// see [`AgentConfig::log_filter`]), and default the identity paths
    /// to `workspace/SOUL.md`/`workspace/AGENT.md` relative to the
    /// current directory. `mcp_registry_path` is always explicit since
    /// it has no sane environment-wide default.
    pub fn from_env(mcp_registry_path: impl Into<PathBuf>) -> Self {
        let api_key = ApiKey::new(std::env::var("OPENAI_API_KEY").unwrap_or_default());
        let model = std::env::var("AGENTIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let log_level = std::env::var("LOG_LEVEL").ok();
        let debug = std::env::var("DEBUG").map(|v| is_truthy(&v)).unwrap_or(false);
        Self {
            api_key,
            model,
            soul_path: PathBuf::from("workspace/SOUL.md"),
            agent_path: PathBuf::from("workspace/AGENT.md"),
            mcp_registry_path: mcp_registry_path.into(),
            transition_limit: DEFAULT_TRANSITION_LIMIT,
            log_level,
            debug,
        }
    }

    pub fn with_identity_paths(mut self, soul_path: impl Into<PathBuf>, agent_path: impl Into<PathBuf>) -> Self {
        self.soul_path = soul_path.into();
        self.agent_path = agent_path.into();
        self
    }

    pub fn with_transition_limit(mut self, limit: u32) -> Self {
        self.transition_limit = limit;
        self
    }

    /// The `tracing_subscriber::EnvFilter` directive string this config
    /// implies: `LOG_LEVEL` (falling back to `RUST_LOG`, then `"info"`)
    /// as the base, with an `agentic=debug` directive appended when
    /// `DEBUG` was truthy. Returned as a plain string so this crate
    /// doesn't need a `tracing-subscriber` dependency of its own — the
    /// binary that owns the subscriber parses it.
    pub fn log_filter(&self) -> String {
        let base = self
            .log_level
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| "info".to_string());
        if self.debug {
            format!("{base},agentic=debug")
        } else {
            base
        }
    }
}

/// `DEBUG=0`/`DEBUG=false` (case-insensitive) and the empty string are
/// falsy; anything else set is truthy.
fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "0" | "false")
}
