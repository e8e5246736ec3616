use agentic_types::data::{AgentState, DataModelError, Decision, EvaluationResult, Plan, Task};
use proptest::prelude::*;

fn arb_task_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,5}".prop_map(|s| s)
}

fn arb_plan_of(ids: Vec<String>) -> Plan {
    let tasks = ids
        .iter()
        .enumerate()
        .map(|(i, id)| Task {
            id: id.clone(),
            description: format!("step {i}"),
            tool_call: None,
            tool_input: None,
            depends_on: if i == 0 { vec![] } else { vec![ids[i - 1].clone()] },
        })
        .collect();
    Plan { tasks, reasoning: "generated".to_string() }
}

proptest! {
    /// A plan built entirely from backward references (each task depends
    /// only on its immediate predecessor) always validates, regardless of
    /// how many tasks or what their ids are, as long as ids are unique.
    #[test]
    fn chained_plans_with_unique_ids_validate(ids in prop::collection::vec(arb_task_id(), 1..8)) {
        let mut unique = ids.clone();
        unique.dedup();
        prop_assume!(unique.len() == ids.len());
        let plan = arb_plan_of(ids);
        prop_assert!(plan.validate().is_ok());
    }
}

#[test]
fn plan_with_self_dependency_is_rejected() {
    let plan = Plan {
        tasks: vec![Task {
            id: "t1".into(),
            description: "d".into(),
            tool_call: None,
            tool_input: None,
            depends_on: vec!["t1".into()],
        }],
        reasoning: String::new(),
    };
    assert!(matches!(plan.validate(), Err(DataModelError::UnknownDependency(_))));
}

#[test]
fn evaluation_result_is_not_part_of_state() {
    // EvaluationResult is logged, never folded into AgentState.
    let state = AgentState::new("s1");
    let _logged = EvaluationResult { decision: Decision::Continue, reasoning: "ok".into() };
    assert!(state.plan.is_none());
}

#[test]
fn fresh_state_round_trips_through_json() {
    let state = AgentState::new("s1").with_user_message("say hi");
    let json = serde_json::to_string(&state).unwrap();
    let back: AgentState = serde_json::from_str(&json).unwrap();
    assert_eq!(state, back);
}
