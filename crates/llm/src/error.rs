//! Errors raised by the LLM provider.

use agentic_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("identity prompt unavailable: {0}")]
    Identity(#[from] agentic_prompt::PromptError),

    #[error("llm transport error: {0}")]
    Transport(String),

    #[error("llm-structured-parse: no valid response after retries; last response: {last_response}")]
    StructuredParse { last_response: String },
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::Identity(e) => e.kind(),
            LlmError::Transport(_) => ErrorKind::LlmTransport,
            LlmError::StructuredParse { .. } => ErrorKind::LlmStructuredParse,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Transport(e.to_string())
    }
}
