//! HTTP-stream transport: each call is its own `POST` whose response
//! body is a newline-delimited JSON stream, consumed incrementally
//! until a response carrying the matching request id is observed.
//!
//! Because every call owns its own request/response exchange end to
//! end, concurrent calls never cross-talk — the only state shared
//! across calls is the monotonic [`IdGenerator`], which is what the
//! spec's multiplexing requirement actually needs to hold.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

use crate::error::TransportError;
use crate::jsonrpc::{self, IdGenerator, ToolDescriptor};
use crate::Transport;

pub struct HttpStreamTransport {
    url: String,
    client: reqwest::Client,
    ids: IdGenerator,
    started: AtomicBool,
}

impl HttpStreamTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new(), ids: IdGenerator::default(), started: AtomicBool::new(false) }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        self.start().await?;

        let id = self.ids.next();
        let body = jsonrpc::build_request(id, method, params);

        let response = self.client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Unavailable(format!(
                "http-stream endpoint returned {}",
                response.status()
            )));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline_at) = buffer.find('\n') {
                let line = buffer[..newline_at].trim().to_string();
                buffer.drain(..=newline_at);
                if let Some(value) = Self::match_line(&line, id)? {
                    return jsonrpc::extract_result(value);
                }
            }
        }

        if let Some(value) = Self::match_line(buffer.trim(), id)? {
            return jsonrpc::extract_result(value);
        }

        Err(TransportError::ProtocolViolation(format!("no response with id {id} observed in stream")))
    }

    fn match_line(line: &str, id: u64) -> Result<Option<Value>, TransportError> {
        if line.is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(line)
            .map_err(|e| TransportError::ProtocolViolation(format!("invalid ndjson line: {e}")))?;
        if jsonrpc::response_id(&value) == Some(id) {
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl Transport for HttpStreamTransport {
    async fn start(&self) -> Result<(), TransportError> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, TransportError> {
        let result = self.request("list_tools", Value::Object(Default::default())).await?;
        jsonrpc::parse_tool_list(result)
    }

    async fn execute_tool(&self, tool_name: &str, input: Value) -> Result<Value, TransportError> {
        let params = serde_json::json!({ "name": tool_name, "arguments": input });
        self.request("call_tool", params).await
    }

    async fn is_alive(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    async fn stop(&self) -> Result<(), TransportError> {
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn list_tools_parses_ndjson_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                format!(
                    "{}\n",
                    json!({"jsonrpc": "2.0", "id": 1, "result": {"tools": [{"name": "now", "description": "current time"}]}})
                ),
                "application/x-ndjson",
            ))
            .mount(&server)
            .await;

        let transport = HttpStreamTransport::new(server.uri());
        let tools = transport.list_tools().await.unwrap();
        assert_eq!(tools[0].name, "now");
    }

    #[tokio::test]
    async fn skips_leading_notifications_before_matching_id() {
        let server = MockServer::start().await;
        let notification = json!({"jsonrpc": "2.0", "method": "progress", "params": {}});
        let response = json!({"jsonrpc": "2.0", "id": 1, "result": {"ok": true}});
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                format!("{notification}\n{response}\n"),
                "application/x-ndjson",
            ))
            .mount(&server)
            .await;

        let transport = HttpStreamTransport::new(server.uri());
        let result = transport.execute_tool("noop", json!({})).await.unwrap();
        assert_eq!(result, json!({"ok": true}));
    }

    #[tokio::test]
    async fn remote_error_envelope_surfaces_as_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                format!("{}\n", json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "boom"}})),
                "application/x-ndjson",
            ))
            .mount(&server)
            .await;

        let transport = HttpStreamTransport::new(server.uri());
        let err = transport.execute_tool("noop", json!({})).await.unwrap_err();
        assert!(matches!(err, TransportError::RemoteError(ref m) if m == "boom"));
    }

    #[tokio::test]
    async fn concurrent_calls_do_not_cross_talk() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(|req: &wiremock::Request| {
                let body: Value = serde_json::from_slice(&req.body).unwrap();
                let id = body["id"].clone();
                ResponseTemplate::new(200).set_body_raw(
                    format!("{}\n", json!({"jsonrpc": "2.0", "id": id, "result": {"echo": id}})),
                    "application/x-ndjson",
                )
            })
            .mount(&server)
            .await;

        let transport = std::sync::Arc::new(HttpStreamTransport::new(server.uri()));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let t = transport.clone();
            handles.push(tokio::spawn(async move { t.execute_tool("echo", json!({})).await.unwrap() }));
        }
        let results: Vec<_> = futures::future::join_all(handles).await.into_iter().map(|r| r.unwrap()).collect();
        let mut ids: Vec<u64> = results.iter().map(|r| r["echo"].as_u64().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8, "every concurrent call must observe its own response");
    }
}
