//! Planner node: asks the LLM for a structured [`Plan`] given the
//! session history, the available tool catalog, and (on a replan) the
//! most recent failure.

use tokio_util::sync::CancellationToken;

use agentic_llm::{InvokeOptions, LlmProvider};
use agentic_mcp::McpExecutor;
use agentic_types::{AgentState, DataModelError, Plan};

use crate::error::AgentError;

const WORKED_EXAMPLE: &str = r#"{"tasks":[{"id":"t1","description":"Look up the current time","tool_call":"clock:now","tool_input":{}}],"reasoning":"one tool call answers the request directly"}"#;

/// Run the Planner: `state → state'`. Does not mutate its input.
pub async fn plan(state: &AgentState, llm: &LlmProvider, mcp: &McpExecutor, cancellation: &CancellationToken) -> Result<AgentState, AgentError> {
    let mut next = state.clone();

    if cancellation.is_cancelled() {
        next.error = Some("cancelled".to_string());
        return Ok(next);
    }

    let prompt = build_prompt(&next, mcp).await;

    let outcome = tokio::select! {
        _ = cancellation.cancelled() => None,
        res = llm.invoke_structured::<Plan>(prompt, &InvokeOptions::default()) => Some(res),
    };

    match outcome {
        None => {
            tracing::warn!("planner: cancelled while awaiting the LLM");
            next.error = Some("cancelled".to_string());
        }
        Some(Ok((plan, _usage))) => match plan.validate() {
            Ok(()) => {
                next.plan = Some(plan);
                next.current_task_index = 0;
                next.plan_started_at = next.execution_results.len();
                next.error = None;
            }
            Err(DataModelError::EmptyPlan) => {
                next.error = Some("plan-empty".to_string());
            }
            Err(e) => {
                next.error = Some(format!("plan-empty: {e}"));
            }
        },
        Some(Err(e)) => {
            tracing::warn!(error = %e, "planner: structured invocation failed");
            next.error = Some(e.to_string());
        }
    }
    Ok(next)
}

async fn build_prompt(state: &AgentState, mcp: &McpExecutor) -> String {
    let schema = schemars::schema_for!(Plan);
    let schema_json = serde_json::to_string_pretty(&schema).unwrap_or_default();

    let mut prompt = String::new();
    prompt.push_str("You are the planning stage of an autonomous agent. Respond with a single JSON object matching exactly this schema:\n\n");
    prompt.push_str(&schema_json);
    prompt.push_str("\n\nWorked example:\n");
    prompt.push_str(WORKED_EXAMPLE);
    prompt.push_str("\n\nAvailable tools:\n");
    prompt.push_str(&tool_listing(mcp).await);

    prompt.push_str("\n\nConversation so far:\n");
    for message in &state.messages {
        prompt.push_str(&format!("- {}\n", message.content()));
    }

    if let Some(error) = &state.error {
        prompt.push_str(&format!("\nThe previous attempt failed: {error}\n"));
        if let Some(last) = state.last_task_result() {
            prompt.push_str(&format!(
                "Last task result: task_id={}, success={}, error={:?}\n",
                last.task_id, last.success, last.error
            ));
        }
        prompt.push_str("Revise the plan to account for this failure.\n");
    }

    prompt
}

async fn tool_listing(mcp: &McpExecutor) -> String {
    let tools = mcp.get_available_tools().await;
    if tools.is_empty() {
        return "(none)".to_string();
    }
    let mut listing = String::new();
    for (server, descriptors) in tools {
        for tool in descriptors {
            listing.push_str(&format!(
                "- {server}:{} — {}\n  input_schema: {}\n",
                tool.name,
                tool.description.as_deref().unwrap_or(""),
                tool.input_schema.as_ref().map(|s| s.to_string()).unwrap_or_else(|| "{}".to_string()),
            ));
        }
    }
    listing
}
