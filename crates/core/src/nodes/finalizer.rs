//! Finalizer node: synthesizes the user-facing [`AgentResponse`]. The
//! last line of defense — it must always produce a response, even if
//! its own LLM call fails.

use tokio_util::sync::CancellationToken;

use agentic_llm::{InvokeOptions, LlmProvider};
use agentic_types::{AgentResponse, AgentState, ExecutionTraceEntry};

use crate::error::AgentError;

/// Run the Finalizer: `state → state'` with `final_response` set. Always
/// produces a response, even if cancelled or if its own LLM call fails —
/// this node is the last line of defense.
pub async fn finalize(state: &AgentState, llm: &LlmProvider, cancellation: &CancellationToken) -> Result<AgentState, AgentError> {
    let mut next = state.clone();
    let trace: Vec<ExecutionTraceEntry> = next.execution_results.iter().map(ExecutionTraceEntry::from).collect();

    let message = if cancellation.is_cancelled() {
        cancelled_message(&next)
    } else {
        let prompt = build_prompt(&next, &trace);
        let outcome = tokio::select! {
            _ = cancellation.cancelled() => None,
            res = llm.invoke(prompt, &InvokeOptions::default()) => Some(res),
        };
        match outcome {
            None => cancelled_message(&next),
            Some(Ok((text, _usage))) => text,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "finalizer: llm call failed, falling back to a summary message");
                fallback_message(&next, &e)
            }
        }
    };

    next.final_response = Some(AgentResponse { message, execution_trace: trace, plan_used: next.plan.clone() });
    Ok(next)
}

fn build_prompt(state: &AgentState, trace: &[ExecutionTraceEntry]) -> String {
    let original_request = state.messages.iter().rev().find_map(|m| match m {
        agentic_types::Message::Human { content } => Some(content.clone()),
        _ => None,
    }).unwrap_or_default();

    let mut prompt = String::new();
    prompt.push_str("Synthesize a final, user-facing answer from the executed plan below. Be direct and concise.\n\n");
    prompt.push_str(&format!("Original request: {original_request}\n\n"));
    if let Some(plan) = &state.plan {
        prompt.push_str(&format!("Plan reasoning: {}\n", plan.reasoning));
    }
    prompt.push_str("Task results:\n");
    for (entry, result) in trace.iter().zip(state.execution_results.iter()) {
        prompt.push_str(&format!("- {}: success={} summary={:?} raw={:?}\n", entry.task_id, entry.success, entry.summary, result.result));
    }
    prompt
}

fn fallback_message(state: &AgentState, error: &agentic_llm::LlmError) -> String {
    let succeeded = state.execution_results.iter().filter(|r| r.success).count();
    let failed = state.execution_results.iter().filter(|r| !r.success).count();
    format!("Unable to synthesize a final answer ({error}). {succeeded} task(s) succeeded and {failed} task(s) failed.")
}

fn cancelled_message(state: &AgentState) -> String {
    let succeeded = state.execution_results.iter().filter(|r| r.success).count();
    let failed = state.execution_results.iter().filter(|r| !r.success).count();
    format!("Cancelled before a final answer could be synthesized. {succeeded} task(s) succeeded and {failed} task(s) failed.")
}
