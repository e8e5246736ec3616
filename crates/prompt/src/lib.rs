//! Identity/personality text loader producing the base system prompt
//! injected as the leading system message of every LLM call.

pub mod error;
pub mod loader;

pub use error::PromptError;
pub use loader::PromptLoader;
