//! OpenAI-compatible chat-completions client with structured-output
//! retry and markdown-fence recovery.

pub mod error;
pub mod provider;
pub mod usage;

pub use error::LlmError;
pub use provider::{InvokeOptions, LlmProvider, LlmProviderConfig, PromptInput};
pub use usage::LlmUsage;
