//! Integration test for the Hello World demo, exercising the full
//! `AgenticClient` facade against a mocked LLM endpoint and an
//! in-process MCP tool.

use std::sync::Arc;

use agentic_core::{Agent, InMemoryCheckpointStore};
use agentic_llm::{LlmProvider, LlmProviderConfig};
use agentic_mcp::{McpConfig, McpExecutor};
use agentic_mcp_sdk::InProcessServer;
use agentic_prompt::PromptLoader;
use agentic_transport::Transport;
use agentic_types::ApiKey;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn identity_loader() -> (tempfile::TempDir, PromptLoader) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("SOUL.md"), "You are a friendly assistant.").unwrap();
    std::fs::write(dir.path().join("AGENT.md"), "Be concise.").unwrap();
    let loader = PromptLoader::new(dir.path().join("SOUL.md"), dir.path().join("AGENT.md"));
    (dir, loader)
}

fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({"choices": [{"message": {"role": "assistant", "content": content}}], "usage": {}})
}

#[tokio::test]
async fn hello_world_no_tools_answers_with_a_greeting() {
    let (_dir, loader) = identity_loader();
    let server = MockServer::start().await;

    let plan_body = r#"{"tasks":[{"id":"t1","description":"Greet the user"}],"reasoning":"direct reply, no tools needed"}"#;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(plan_body)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("Hello there!")))
        .mount(&server)
        .await;

    let llm = LlmProvider::new(LlmProviderConfig {
        api_key: ApiKey::new("test"),
        model: "gpt-4o-mini".to_string(),
        base_url: Some(server.uri()),
        prompt_loader: loader,
    });
    let mcp = Arc::new(McpExecutor::new(McpConfig::parse(r#"{"mcpServers": {}}"#).unwrap()));
    let agent = Agent::from_parts(llm, mcp, Arc::new(InMemoryCheckpointStore::new()), 50);

    let response = agent.invoke("hello-world-demo", "say hi").await.unwrap();
    assert!(response.message.contains("Hello"));

    agent.close().await;
}

#[tokio::test]
async fn single_tool_call_feeds_its_result_into_the_final_answer() {
    let (_dir, loader) = identity_loader();
    let server = MockServer::start().await;

    let plan_body = r#"{"tasks":[{"id":"t1","description":"look up the time","tool_call":"clock:now","tool_input":{}}],"reasoning":"one tool call answers this"}"#;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(plan_body)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("The current time is 2025-01-01T00:00:00Z.")))
        .mount(&server)
        .await;

    let llm = LlmProvider::new(LlmProviderConfig {
        api_key: ApiKey::new("test"),
        model: "gpt-4o-mini".to_string(),
        base_url: Some(server.uri()),
        prompt_loader: loader,
    });

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
    let response = agent.invoke("hello-world-demo", "what time is it").await.unwrap();
    assert!(response.message.contains("2025-01-01T00:00:00Z"));
}
