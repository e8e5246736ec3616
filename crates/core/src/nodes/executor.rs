//! Executor node: runs exactly the task at `current_task_index`, either
//! as an MCP tool dispatch or as a direct LLM call.

use tokio_util::sync::CancellationToken;

use agentic_llm::{InvokeOptions, LlmProvider};
use agentic_mcp::McpExecutor;
use agentic_types::{AgentState, Task, TaskResult};

use crate::error::AgentError;

/// Run the Executor: `state → state'`. Does not mutate its input.
///
/// Races dispatch against `cancellation`: if the token fires before the
/// tool call or LLM call returns, the task is recorded as a failed
/// `TaskResult` with `error = "cancelled"` instead of waiting it out.
pub async fn execute(state: &AgentState, llm: &LlmProvider, mcp: &McpExecutor, cancellation: &CancellationToken) -> Result<AgentState, AgentError> {
    let mut next = state.clone();

    let Some(plan) = &next.plan else {
        next.error = Some("executor invoked without a plan".to_string());
        return Ok(next);
    };
    let Some(task) = plan.task_at(next.current_task_index) else {
        next.error = Some("executor invoked with an out-of-range task index".to_string());
        return Ok(next);
    };
    let task = task.clone();

    let unsatisfied = unsatisfied_dependencies(&task, &next.execution_results);
    if !unsatisfied.is_empty() {
        let result = TaskResult::failure(task.id.clone(), format!("dependency-unsatisfied: {}", unsatisfied.join(", ")));
        next.error = result.error.clone();
        next.execution_results.push(result);
        return Ok(next);
    }

    let result = if cancellation.is_cancelled() {
        tracing::warn!(task_id = %task.id, "executor: task cancelled before dispatch");
        TaskResult::failure(task.id.clone(), "cancelled")
    } else {
        match resolve_tool_input(&task, &next.execution_results) {
            Ok(resolved_input) => {
                tokio::select! {
                    _ = cancellation.cancelled() => {
                        tracing::warn!(task_id = %task.id, "executor: task cancelled");
                        TaskResult::failure(task.id.clone(), "cancelled")
                    }
                    result = dispatch(&task, resolved_input, llm, mcp) => result,
                }
            }
            Err(message) => TaskResult::failure(task.id.clone(), message),
        }
    };

    if result.success {
        next.error = None;
        next.current_task_index += 1;
    } else {
        next.error = result.error.clone();
    }
    next.execution_results.push(result);
    Ok(next)
}

/// Every `depends_on` id that has no successful prior `TaskResult`.
fn unsatisfied_dependencies(task: &Task, results: &[TaskResult]) -> Vec<String> {
    task.depends_on
        .iter()
        .filter(|dep| !results.iter().any(|r| &r.task_id == *dep && r.success))
        .cloned()
        .collect()
}

/// Resolve `"${<task_id>.result}"` placeholders against prior results.
/// Exactly one placeholder per string value, no nesting; anything else
/// passes through verbatim.
fn resolve_tool_input(task: &Task, results: &[TaskResult]) -> Result<serde_json::Map<String, serde_json::Value>, String> {
    let Some(input) = &task.tool_input else {
        return Ok(serde_json::Map::new());
    };
    let mut resolved = serde_json::Map::new();
    for (key, value) in input {
        resolved.insert(key.clone(), resolve_value(value, results)?);
    }
    Ok(resolved)
}

fn resolve_value(value: &serde_json::Value, results: &[TaskResult]) -> Result<serde_json::Value, String> {
    let Some(text) = value.as_str() else {
        return Ok(value.clone());
    };
    let Some(reference) = parse_reference(text) else {
        return Ok(value.clone());
    };
    results
        .iter()
        .find(|r| r.task_id == reference)
        .and_then(|r| r.result.clone())
        .ok_or_else(|| format!("unresolved reference: {text}"))
}

/// `"${task_id.result}"` → `Some("task_id")`. The whole string must
/// match; anything else (including partial matches) is not a reference.
fn parse_reference(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("${")?.strip_suffix('}')?;
    inner.strip_suffix(".result")
}

async fn dispatch(task: &Task, resolved_input: serde_json::Map<String, serde_json::Value>, llm: &LlmProvider, mcp: &McpExecutor) -> TaskResult {
    if let Some(tool_call) = &task.tool_call {
        let outcome = mcp.execute_tool(tool_call, serde_json::Value::Object(resolved_input)).await;
        return match (outcome.success, outcome.result, outcome.error) {
            (true, Some(result), _) => TaskResult::success(task.id.clone(), result),
            (true, None, _) => TaskResult::success(task.id.clone(), serde_json::Value::Null),
            (false, _, error) => TaskResult::failure(task.id.clone(), error.unwrap_or_else(|| "tool execution failed".to_string())),
        };
    }

    let prompt = format!("{}\n\nPrior task results so far: {}", task.description, serde_json::Value::Object(resolved_input));
    match llm.invoke(prompt, &InvokeOptions::default()).await {
        Ok((text, _usage)) => TaskResult::success(task.id.clone(), serde_json::Value::String(text)),
        Err(e) => TaskResult::failure(task.id.clone(), e.to_string()),
    }
}
