//! The agent graph: wires the four nodes into the cyclic state machine
//! and exposes the public `Agent` surface — `invoke`, `clear_session`,
//! `close`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use agentic_llm::{LlmProvider, LlmProviderConfig};
use agentic_mcp::{McpConfig, McpExecutor};
use agentic_prompt::PromptLoader;
use agentic_types::{AgentResponse, AgentState, Decision, ErrorKind};

use crate::checkpoint::CheckpointStore;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::nodes;

/// The orchestration engine for one process: one LLM provider, one MCP
/// executor, one checkpoint store, driving any number of sessions.
///
/// Concurrent `invoke` calls on different `session_id`s are safe — the
/// checkpoint store and MCP executor are the only shared mutable state,
/// and both guard their own invariants (per-session locking, an
/// internally synchronized transport/catalog cache).
pub struct Agent {
    llm: LlmProvider,
    mcp: Arc<McpExecutor>,
    checkpoints: Arc<dyn CheckpointStore>,
    transition_limit: u32,
}

impl Agent {
    /// Build the LLM provider, MCP executor and prompt loader from
    /// `config`, reading and validating the MCP registry file eagerly so
    /// construction fails fast on a missing/malformed registry.
    pub fn new(config: AgentConfig, checkpoints: Arc<dyn CheckpointStore>) -> Result<Self, AgentError> {
        let mcp_config = McpConfig::load(&config.mcp_registry_path)?;
        let prompt_loader = PromptLoader::new(config.soul_path.clone(), config.agent_path.clone());
        let llm = LlmProvider::new(LlmProviderConfig {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: None,
            prompt_loader,
        });
        Ok(Self { llm, mcp: Arc::new(McpExecutor::new(mcp_config)), checkpoints, transition_limit: config.transition_limit })
    }

    /// Construct directly from already-built components, bypassing
    /// `AgentConfig`/env lookup. Used by tests and by callers that build
    /// their own MCP executor (e.g. with an in-process transport).
    pub fn from_parts(llm: LlmProvider, mcp: Arc<McpExecutor>, checkpoints: Arc<dyn CheckpointStore>, transition_limit: u32) -> Self {
        Self { llm, mcp, checkpoints, transition_limit }
    }

    /// Load (or create) the session snapshot for `session_id`, append
    /// `user_message`, run the state machine to termination, persist the
    /// resulting snapshot and return its `final_response`.
    ///
    /// Never cancellable from the outside — equivalent to
    /// `invoke_cancellable` with a token that is never cancelled.
    pub async fn invoke(&self, session_id: &str, user_message: impl Into<String>) -> Result<AgentResponse, AgentError> {
        self.invoke_cancellable(session_id, user_message, CancellationToken::new()).await
    }

    /// Same as [`Agent::invoke`], but `cancellation` is checked before and
    /// during every blocking operation. A cancellation that fires mid-task
    /// is observed by the caller as a failed response, not an error —
    /// the state machine always runs through to a `Finalize` step so a
    /// checkpoint and an `AgentResponse` are still produced.
    pub async fn invoke_cancellable(&self, session_id: &str, user_message: impl Into<String>, cancellation: CancellationToken) -> Result<AgentResponse, AgentError> {
        let mut state = match self.checkpoints.get(session_id).await? {
            Some(state) => state,
            None => AgentState::new(session_id),
        };
        state = state.with_user_message(user_message);

        let mut transitions: u32 = 0;
        loop {
            if transitions >= self.transition_limit {
                tracing::warn!(session_id, transitions, "transition limit exceeded, forcing finalization");
                state.error = Some(ErrorKind::TransitionLimitExceeded.as_str().to_string());
                state = nodes::finalize(&state, &self.llm, &cancellation).await?;
                break;
            }

            let decision = nodes::evaluate(&state).decision;
            tracing::debug!(session_id, ?decision, transitions, "routing decision");

            state = match decision {
                Decision::Replan => nodes::plan(&state, &self.llm, &self.mcp, &cancellation).await?,
                Decision::Continue => nodes::execute(&state, &self.llm, &self.mcp, &cancellation).await?,
                Decision::Finalize => nodes::finalize(&state, &self.llm, &cancellation).await?,
            };
            transitions += 1;

            if state.is_terminal() {
                break;
            }
        }

        self.checkpoints.put(session_id, &state).await?;
        Ok(state.final_response.clone().unwrap_or_else(|| AgentResponse {
            message: "the agent terminated without producing a response".to_string(),
            execution_trace: Vec::new(),
            plan_used: None,
        }))
    }

    /// Delete the persisted snapshot for `session_id`.
    pub async fn clear_session(&self, session_id: &str) -> Result<(), AgentError> {
        self.checkpoints.delete(session_id).await?;
        Ok(())
    }

    /// Release every started transport. Idempotent — safe to call more
    /// than once, and safe to call on an `Agent` that never started any
    /// transport.
    pub async fn close(&self) {
        self.mcp.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::InMemoryCheckpointStore;
    use agentic_mcp::McpConfig;
    use agentic_mcp_sdk::InProcessServer;
    use agentic_transport::Transport;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn identity_loader() -> (tempfile::TempDir, PromptLoader) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("SOUL.md"), "helpful").unwrap();
        std::fs::write(dir.path().join("AGENT.md"), "terse").unwrap();
        let loader = PromptLoader::new(dir.path().join("SOUL.md"), dir.path().join("AGENT.md"));
        (dir, loader)
    }

    fn llm_provider(base_url: String, loader: PromptLoader) -> LlmProvider {
        LlmProvider::new(LlmProviderConfig {
            api_key: agentic_types::ApiKey::new("test"),
            model: "gpt-4o-mini".to_string(),
            base_url: Some(base_url),
            prompt_loader: loader,
        })
    }

    fn empty_mcp() -> Arc<McpExecutor> {
        Arc::new(McpExecutor::new(McpConfig::parse(r#"{"mcpServers": {}}"#).unwrap()))
    }

    fn plan_response(body: &str) -> serde_json::Value {
        serde_json::json!({"choices": [{"message": {"role": "assistant", "content": body}}], "usage": {}})
    }

    /// Scenario 1: a one-task, no-tool-call plan terminates after exactly
    /// Planner → Executor → Evaluator → Finalizer — three state
    /// transitions, ending in a terminal state with `final_response` set.
    #[tokio::test]
    async fn hello_world_completes_in_three_transitions() {
        let (_dir, loader) = identity_loader();
        let server = MockServer::start().await;

        let plan_body = r#"{"tasks":[{"id":"t1","description":"Greet the user"}],"reasoning":"direct reply"}"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(plan_response(plan_body)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(plan_response("Hello!")))
            .mount(&server)
            .await;

        let llm = llm_provider(server.uri(), loader);
        let agent = Agent::from_parts(llm, empty_mcp(), Arc::new(InMemoryCheckpointStore::new()), 50);

        let response = agent.invoke("s1", "say hi").await.unwrap();
        assert!(response.message.contains("Hello"));
        assert_eq!(response.execution_trace.len(), 1);
    }

    #[tokio::test]
    async fn clear_session_deletes_the_snapshot() {
        let (_dir, loader) = identity_loader();
        let llm = llm_provider("http://127.0.0.1:1".to_string(), loader);
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let agent = Agent::from_parts(llm, empty_mcp(), checkpoints.clone(), 50);

        checkpoints.put("s1", &AgentState::new("s1").with_user_message("hi")).await.unwrap();
        agent.clear_session("s1").await.unwrap();
        assert!(checkpoints.get("s1").await.unwrap().is_none());
    }

    /// A planner that always returns the same unparseable body forces a
    /// finalized response once the transition limit is hit, rather than
    /// looping forever.
    #[tokio::test]
    async fn pathological_replanning_is_bounded_by_the_transition_limit() {
        let (_dir, loader) = identity_loader();
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200).set_body_json(plan_response("not json"))).mount(&server).await;

        let llm = llm_provider(server.uri(), loader);
        let agent = Agent::from_parts(llm, empty_mcp(), Arc::new(InMemoryCheckpointStore::new()), 4);

        let response = agent.invoke("s1", "do the impossible").await.unwrap();
        assert!(!response.message.is_empty());
    }

    #[tokio::test]
    async fn single_tool_call_surfaces_in_the_final_message() {
        let (_dir, loader) = identity_loader();
        let server = MockServer::start().await;
        let plan_body = r#"{"tasks":[{"id":"t1","description":"get the time","tool_call":"clock:now","tool_input":{}}],"reasoning":"one tool answers this"}"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(plan_response(plan_body)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(plan_response("The current time is 2025-01-01T00:00:00Z.")))
            .mount(&server)
            .await;

        let llm = llm_provider(server.uri(), loader);
        let in_process = InProcessServer::new();
        in_process
            .register_tool("now", Some("current time".into()), serde_json::json!({"type": "object"}), |_| async move {
                Ok(serde_json::json!({"iso": "2025-01-01T00:00:00Z"}))
            })
            .await;
        let mcp = Arc::new(McpExecutor::with_factory(McpConfig::parse(r#"{"mcpServers": {"clock": {"command": "unused"}}}"#).unwrap(), move |_, _| {
            in_process.clone() as Arc<dyn Transport>
        }));

        let agent = Agent::from_parts(llm, mcp, Arc::new(InMemoryCheckpointStore::new()), 50);
        let response = agent.invoke("s1", "what time is it").await.unwrap();
        assert!(response.message.contains("2025-01-01T00:00:00Z"));
    }

    /// A task failing must not wedge the state machine forever: once the
    /// Planner produces a plan that actually succeeds, the stale failed
    /// `TaskResult` left over from the replaced plan must not keep
    /// forcing `Replan` — the engine has to reach `Finalize`.
    #[tokio::test]
    async fn recovers_after_a_failed_task_once_the_replan_succeeds() {
        let (_dir, loader) = identity_loader();
        let server = MockServer::start().await;

        let failing_plan = r#"{"tasks":[{"id":"t1","description":"get the time","tool_call":"clock:now","tool_input":{}}],"reasoning":"try the clock tool"}"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(plan_response(failing_plan)))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let recovery_plan = r#"{"tasks":[{"id":"t2","description":"answer directly"}],"reasoning":"the tool is unavailable, answer from knowledge instead"}"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(plan_response(recovery_plan)))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(plan_response("task two done")))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(plan_response("All done, one task answered directly.")))
            .mount(&server)
            .await;

        let llm = llm_provider(server.uri(), loader);
        // `clock` is never registered, so the first plan's tool call fails
        // with `tool-server-disabled` — that's the failure the engine must
        // recover from.
        let agent = Agent::from_parts(llm, empty_mcp(), Arc::new(InMemoryCheckpointStore::new()), 50);

        let response = agent.invoke("s1", "what time is it").await.unwrap();
        assert!(response.message.contains("All done"));
    }

    /// A pre-cancelled token short-circuits the Planner immediately, but
    /// the graph still runs through to a `Finalize` step and returns a
    /// real `AgentResponse` rather than surfacing an error to the caller.
    #[tokio::test]
    async fn cancellation_still_yields_a_final_response() {
        let (_dir, loader) = identity_loader();
        let llm = llm_provider("http://127.0.0.1:1".to_string(), loader);
        let agent = Agent::from_parts(llm, empty_mcp(), Arc::new(InMemoryCheckpointStore::new()), 50);

        let token = CancellationToken::new();
        token.cancel();
        let response = agent.invoke_cancellable("s1", "say hi", token).await.unwrap();
        assert!(response.message.contains("Cancelled"));
    }
}
