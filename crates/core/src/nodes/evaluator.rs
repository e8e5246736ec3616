//! Evaluator node: a pure routing function over `state`. Mutates
//! nothing and is never itself fallible — it only ever produces one of
//! three `Decision`s.

use agentic_types::{AgentState, Decision, EvaluationResult};

/// Compute the next routing decision from `state` alone.
///
/// | Precondition | Decision |
/// |---|---|
/// | `state.error` is set, or no plan exists, or the current plan's last `TaskResult` failed | `Replan` |
/// | plan exists, no error, `current_task_index < len(tasks)` | `Continue` |
/// | plan exists, no error, `current_task_index >= len(tasks)` | `Finalize` |
///
/// The "last `TaskResult` failed" check is scoped to results produced
/// under the *current* plan (`AgentState::last_task_result_for_current_plan`),
/// not the whole session's append-only history — a failed result left
/// over from a plan that the Planner has since replaced must not force
/// a replan forever.
pub fn evaluate(state: &AgentState) -> EvaluationResult {
    if state.error.is_some() {
        return EvaluationResult { decision: Decision::Replan, reasoning: "state.error is set".to_string() };
    }
    let Some(plan) = &state.plan else {
        return EvaluationResult { decision: Decision::Replan, reasoning: "no plan exists".to_string() };
    };
    if let Some(last) = state.last_task_result_for_current_plan() {
        if !last.success {
            return EvaluationResult { decision: Decision::Replan, reasoning: "last task result failed".to_string() };
        }
    }
    if state.current_task_index < plan.tasks.len() {
        EvaluationResult { decision: Decision::Continue, reasoning: "tasks remain".to_string() }
    } else {
        EvaluationResult { decision: Decision::Finalize, reasoning: "all tasks completed".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_types::{Plan, Task, TaskResult};

    fn plan_of(n: usize) -> Plan {
        Plan { tasks: (0..n).map(|i| Task { id: format!("t{i}"), description: "x".into(), tool_call: None, tool_input: None, depends_on: vec![] }).collect(), reasoning: String::new() }
    }

    #[test]
    fn no_plan_routes_to_replan() {
        let state = AgentState::new("s1");
        assert_eq!(evaluate(&state).decision, Decision::Replan);
    }

    #[test]
    fn pending_error_routes_to_replan_even_with_a_plan() {
        let mut state = AgentState::new("s1");
        state.plan = Some(plan_of(1));
        state.error = Some("boom".to_string());
        assert_eq!(evaluate(&state).decision, Decision::Replan);
    }

    #[test]
    fn failed_last_result_routes_to_replan() {
        let mut state = AgentState::new("s1");
        state.plan = Some(plan_of(1));
        state.execution_results.push(TaskResult::failure("t0", "boom"));
        assert_eq!(evaluate(&state).decision, Decision::Replan);
    }

    /// A failed `TaskResult` left over from a plan that has since been
    /// replaced must not permanently force `Replan` — once
    /// `plan_started_at` has advanced past it, it belongs to a dead
    /// plan and should not gate routing for the new one.
    #[test]
    fn stale_failure_from_a_replaced_plan_does_not_block_continuation() {
        let mut state = AgentState::new("s1");
        state.execution_results.push(TaskResult::failure("old-t0", "boom"));
        state.plan = Some(plan_of(1));
        state.plan_started_at = state.execution_results.len();
        assert_eq!(evaluate(&state).decision, Decision::Continue);
    }

    #[test]
    fn remaining_tasks_route_to_continue() {
        let mut state = AgentState::new("s1");
        state.plan = Some(plan_of(2));
        state.current_task_index = 1;
        assert_eq!(evaluate(&state).decision, Decision::Continue);
    }

    #[test]
    fn exhausted_tasks_route_to_finalize() {
        let mut state = AgentState::new("s1");
        state.plan = Some(plan_of(1));
        state.current_task_index = 1;
        assert_eq!(evaluate(&state).decision, Decision::Finalize);
    }

    #[test]
    fn routing_is_a_pure_function_of_state() {
        let mut state = AgentState::new("s1");
        state.plan = Some(plan_of(1));
        assert_eq!(evaluate(&state).decision, evaluate(&state).decision);
    }
}
