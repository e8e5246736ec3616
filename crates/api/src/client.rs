//! Thin wrapper over [`agentic_core::Agent`] — the single entry point
//! most callers need.

use std::sync::Arc;

use agentic_core::{Agent, AgentConfig, AgentError, AgentResponse, CheckpointStore, InMemoryCheckpointStore};

/// Convenience wrapper that owns an [`Agent`] and defaults to an
/// in-memory checkpoint store. Wrap your own [`CheckpointStore`] with
/// [`AgenticClient::with_checkpoint_store`] for durable sessions.
pub struct AgenticClient {
    agent: Agent,
}

impl AgenticClient {
    /// Build a client from `config`, checkpointing sessions in memory
    /// only — snapshots do not survive process restart.
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        Self::with_checkpoint_store(config, Arc::new(InMemoryCheckpointStore::new()))
    }

    /// Build a client from `config` against an explicit checkpoint
    /// store backend.
    pub fn with_checkpoint_store(config: AgentConfig, checkpoints: Arc<dyn CheckpointStore>) -> Result<Self, AgentError> {
        Ok(Self { agent: Agent::new(config, checkpoints)? })
    }

    /// Run one request to termination: loads the session, drives the
    /// plan/execute/evaluate/finalize loop, persists the resulting
    /// snapshot, and returns the synthesized response.
    pub async fn invoke(&self, session_id: &str, user_message: impl Into<String>) -> Result<AgentResponse, AgentError> {
        self.agent.invoke(session_id, user_message).await
    }

    /// Delete a session's persisted snapshot.
    pub async fn clear_session(&self, session_id: &str) -> Result<(), AgentError> {
        self.agent.clear_session(session_id).await
    }

    /// Release every started MCP transport. Idempotent.
    pub async fn close(&self) {
        self.agent.close().await
    }
}
