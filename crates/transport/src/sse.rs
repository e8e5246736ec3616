//! SSE transport: a companion `POST` endpoint carries requests, and a
//! single long-lived `GET` (`text/event-stream`) carries every
//! response as a `data:` event. Unlike the HTTP-stream variant, the
//! event stream is shared across calls, so responses are correlated
//! by JSON-RPC id through an id-keyed pending map, same as the stdio
//! transport's subprocess-backed correlation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Event as SseEvent, EventSource};
use serde_json::Value;
use tokio::sync::{oneshot, Mutex};

use crate::error::TransportError;
use crate::jsonrpc::{self, IdGenerator, ToolDescriptor};
use crate::Transport;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, TransportError>>>>>;

struct Running {
    pending: PendingMap,
    reader_task: tokio::task::JoinHandle<()>,
}

pub struct SseTransport {
    url: String,
    client: reqwest::Client,
    ids: IdGenerator,
    state: Mutex<Option<Running>>,
}

impl SseTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new(), ids: IdGenerator::default(), state: Mutex::new(None) }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        self.start().await?;

        let id = self.ids.next();
        let (tx, rx) = oneshot::channel();

        {
            let guard = self.state.lock().await;
            let running = guard.as_ref().ok_or_else(|| TransportError::Unavailable("sse transport not started".into()))?;
            running.pending.lock().await.insert(id, tx);
        }

        let body = jsonrpc::build_request(id, method, params);
        let response = self.client.post(&self.url).json(&body).send().await;

        match response {
            Ok(r) if r.status().is_success() => {}
            Ok(r) => {
                self.forget(id).await;
                return Err(TransportError::Unavailable(format!("sse companion POST returned {}", r.status())));
            }
            Err(e) => {
                self.forget(id).await;
                return Err(e.into());
            }
        }

        rx.await.map_err(|_| TransportError::Unavailable("sse event stream closed before a response arrived".into()))?
    }

    async fn forget(&self, id: u64) {
        if let Some(running) = self.state.lock().await.as_ref() {
            running.pending.lock().await.remove(&id);
        }
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn start(&self) -> Result<(), TransportError> {
        let mut guard = self.state.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let mut source = EventSource::get(&self.url);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let pending_for_reader = pending.clone();
        let url = self.url.clone();

        let reader_task = tokio::spawn(async move {
            while let Some(event) = source.next().await {
                match event {
                    Ok(SseEvent::Open) => {}
                    Ok(SseEvent::Message(message)) => {
                        let parsed: Value = match serde_json::from_str(&message.data) {
                            Ok(v) => v,
                            Err(e) => {
                                tracing::warn!(%url, error = %e, "sse transport: invalid event payload, discarding");
                                continue;
                            }
                        };
                        let Some(id) = jsonrpc::response_id(&parsed) else {
                            tracing::warn!(%url, "sse transport: event with no id, discarding");
                            continue;
                        };
                        let mut map = pending_for_reader.lock().await;
                        if let Some(sender) = map.remove(&id) {
                            let _ = sender.send(jsonrpc::extract_result(parsed));
                        } else {
                            tracing::warn!(%url, id, "sse transport: stray response id, discarding");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(%url, error = %e, "sse transport: stream closed");
                        break;
                    }
                }
            }
        });

        *guard = Some(Running { pending, reader_task });
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
        self.state.lock().await.is_some()
    }

    async fn stop(&self) -> Result<(), TransportError> {
        let mut guard = self.state.lock().await;
        let Some(running) = guard.take() else {
            return Ok(());
        };
        running.reader_task.abort();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_is_idempotent_against_an_unreachable_endpoint() {
        // EventSource::get does not fail synchronously on an unreachable
        // endpoint; it reports the failure on the stream itself, so
        // `start` here only has to be idempotent about installing the
        // reader task.
        let transport = SseTransport::new("http://127.0.0.1:1/events");
        transport.start().await.unwrap();
        transport.start().await.unwrap();
        transport.stop().await.unwrap();
        transport.stop().await.unwrap();
    }
}
