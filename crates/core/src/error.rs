//! The one top-level error type every public `agentic-core` function
//! returns, composed from each lower layer's own scoped error enum.

use agentic_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("identity: {0}")]
    Identity(#[from] agentic_prompt::PromptError),

    #[error("mcp config: {0}")]
    McpConfig(#[from] agentic_mcp::McpConfigError),

    #[error("llm: {0}")]
    Llm(#[from] agentic_llm::LlmError),

    #[error("checkpoint: {0}")]
    Checkpoint(#[from] crate::checkpoint::CheckpointError),
}

impl AgentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Identity(e) => e.kind(),
            AgentError::McpConfig(e) => e.kind(),
            AgentError::Llm(e) => e.kind(),
            AgentError::Checkpoint(e) => e.kind(),
        }
    }
}
