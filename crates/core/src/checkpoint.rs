//! Session snapshot persistence: the `CheckpointStore` trait plus one
//! in-memory reference implementation.
//!
//! A durable backend (SQL, object storage, ...) is a drop-in future
//! addition behind the same trait; this crate ships only the in-memory
//! one, keyed by `session_id` with per-session locking so unrelated
//! sessions never contend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use agentic_types::{AgentState, ErrorKind};

/// Errors raised by a [`CheckpointStore`] backend. The in-memory
/// reference implementation never produces one; this exists for
/// backends that do real I/O.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint backend error for session {session_id}: {message}")]
    Backend { session_id: String, message: String },
}

impl CheckpointError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::RemoteError
    }
}

/// A key/value persistence layer indexed by `session_id`, storing an
/// opaque snapshot of an [`AgentState`].
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<AgentState>, CheckpointError>;
    async fn put(&self, session_id: &str, state: &AgentState) -> Result<(), CheckpointError>;
    async fn delete(&self, session_id: &str) -> Result<(), CheckpointError>;
}

/// Reference `CheckpointStore`: an `Arc<Mutex<...>>` per session instead
/// of one lock guarding the whole map, so two different sessions can
/// checkpoint concurrently.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<Option<Vec<u8>>>>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, session_id: &str) -> Arc<Mutex<Option<Vec<u8>>>> {
        self.sessions
            .lock()
            .await
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn get(&self, session_id: &str) -> Result<Option<AgentState>, CheckpointError> {
        let slot = self.slot(session_id).await;
        let bytes = slot.lock().await;
        Ok(match bytes.as_ref() {
            Some(bytes) => Some(serde_json::from_slice(bytes).map_err(|e| CheckpointError::Backend {
                session_id: session_id.to_string(),
                message: e.to_string(),
            })?),
            None => None,
        })
    }

    async fn put(&self, session_id: &str, state: &AgentState) -> Result<(), CheckpointError> {
        let bytes = serde_json::to_vec(state).map_err(|e| CheckpointError::Backend {
            session_id: session_id.to_string(),
            message: e.to_string(),
        })?;
        let slot = self.slot(session_id).await;
        *slot.lock().await = Some(bytes);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), CheckpointError> {
        let slot = self.slot(session_id).await;
        *slot.lock().await = None;
        Ok(())
    }
}
