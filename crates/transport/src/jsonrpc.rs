//! The JSON-RPC 2.0 request/response envelope shared by all three transport
//! variants. Request ids are monotonically increasing per transport;
//! responses are correlated by id and stray or mismatched ids are
//! discarded with a warning.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};

use crate::error::TransportError;

/// A tool descriptor as returned by a server's `list_tools` method.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "input_schema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// Monotonically increasing request id generator, one per transport
/// instance.
#[derive(Debug, Default)]
pub struct IdGenerator(AtomicU64);

impl IdGenerator {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

pub fn build_request(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

/// Extract the `result` or `error` field from a JSON-RPC response body
/// already known to correlate with the request that was sent.
pub fn extract_result(response: Value) -> Result<Value, TransportError> {
    if let Some(error) = response.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown remote error")
            .to_string();
        return Err(TransportError::RemoteError(message));
    }
    response
        .get("result")
        .cloned()
        .ok_or_else(|| TransportError::ProtocolViolation("response has neither result nor error".into()))
}

/// Parse a `{tools: [...]}` result payload into tool descriptors.
pub fn parse_tool_list(result: Value) -> Result<Vec<ToolDescriptor>, TransportError> {
    let tools = result
        .get("tools")
        .ok_or_else(|| TransportError::ProtocolViolation("list_tools result missing 'tools'".into()))?;
    serde_json::from_value(tools.clone()).map_err(TransportError::from)
}

/// The response id observed on an incoming message, if it looks like a
/// JSON-RPC response at all.
pub fn response_id(value: &Value) -> Option<u64> {
    value.get("id").and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_generator_is_monotonic_and_starts_at_one() {
        let gen = IdGenerator::default();
        assert_eq!(gen.next(), 1);
        assert_eq!(gen.next(), 2);
        assert_eq!(gen.next(), 3);
    }

    #[test]
    fn extract_result_maps_error_envelope() {
        let resp = json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "nope"}});
        let err = extract_result(resp).unwrap_err();
        assert!(matches!(err, TransportError::RemoteError(ref m) if m == "nope"));
    }

    #[test]
    fn extract_result_returns_result_field() {
        let resp = json!({"jsonrpc": "2.0", "id": 1, "result": {"ok": true}});
        assert_eq!(extract_result(resp).unwrap(), json!({"ok": true}));
    }
}
