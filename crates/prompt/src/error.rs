//! Errors raised while loading identity text.

use agentic_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PromptError {
    #[error("identity file missing: {0}")]
    Missing(String),
}

impl PromptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PromptError::Missing(_) => ErrorKind::IdentityMissing,
        }
    }
}
