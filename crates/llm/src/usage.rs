//! Token usage accounting, recorded whenever the vendor exposes it.

use serde::{Deserialize, Serialize};

/// Per-call token usage. Every field is optional because the vendor may
/// not report usage at all; absence is not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl LlmUsage {
    pub(crate) fn from_response(value: &serde_json::Value) -> Self {
        let usage = &value["usage"];
        Self {
            prompt_tokens: usage["prompt_tokens"].as_u64(),
            completion_tokens: usage["completion_tokens"].as_u64(),
            total_tokens: usage["total_tokens"].as_u64(),
        }
    }
}
