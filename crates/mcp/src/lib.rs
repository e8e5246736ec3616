//! MCP server registry, tool-catalog caching and dispatch.

pub mod config;
pub mod executor;
pub mod rate_limiter;
pub mod schema;

pub use config::{McpConfig, McpConfigError, McpServerEntry, McpTransportKind};
pub use executor::{default_transport, global, install_global, McpExecutor, ToolOutcome, ValidationResult};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use schema::ToolDefinition;
