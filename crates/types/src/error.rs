//! Shared error taxonomy.
//!
//! Every fallible crate in the workspace defines its own `thiserror` enum
//! scoped to its own concerns, but all of them tag their variants with one
//! of these [`ErrorKind`]s so callers (and tests) can match on the kind
//! without string-parsing a message. `agentic_core::AgentError` is the one
//! type that wraps every lower-layer error via `#[from]`.

use std::fmt;

/// The error taxonomy described by the orchestration engine's error
/// handling design. One tag per row of that table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    IdentityMissing,
    ConfigMissing,
    ConfigMalformed,
    LlmTransport,
    LlmStructuredParse,
    PlanEmpty,
    ToolServerDisabled,
    ToolNotFound,
    DependencyUnsatisfied,
    TransportUnavailable,
    ProtocolViolation,
    Timeout,
    RemoteError,
    TransitionLimitExceeded,
    Cancelled,
}

impl ErrorKind {
    /// The `kebab-case` tag used in the error handling design's table.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::IdentityMissing => "identity-missing",
            ErrorKind::ConfigMissing => "config-missing",
            ErrorKind::ConfigMalformed => "config-malformed",
            ErrorKind::LlmTransport => "llm-transport",
            ErrorKind::LlmStructuredParse => "llm-structured-parse",
            ErrorKind::PlanEmpty => "plan-empty",
            ErrorKind::ToolServerDisabled => "tool-server-disabled",
            ErrorKind::ToolNotFound => "tool-not-found",
            ErrorKind::DependencyUnsatisfied => "dependency-unsatisfied",
            ErrorKind::TransportUnavailable => "transport-unavailable",
            ErrorKind::ProtocolViolation => "protocol-violation",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RemoteError => "remote-error",
            ErrorKind::TransitionLimitExceeded => "transition-limit-exceeded",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
