//! The session-spanning data model: [`Task`], [`Plan`], [`TaskResult`],
//! [`EvaluationResult`], [`AgentResponse`] and the [`AgentState`] snapshot
//! that ties them together.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One message in the conversational history attached to an [`AgentState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System { content: String },
    Human { content: String },
    Assistant { content: String },
    Tool { content: String, tool_call_id: Option<String> },
}

impl Message {
    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::Human { content }
            | Message::Assistant { content }
            | Message::Tool { content, .. } => content,
        }
    }
}

/// A single reason a [`Task`] or [`Plan`] fails the shape invariants the
/// engine requires before it will act on them.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DataModelError {
    #[error("tool_call {0:?} must have exactly one server and one tool segment ('server:tool')")]
    MalformedToolCall(String),
    #[error("depends_on references unknown or later task id {0:?}")]
    UnknownDependency(String),
    #[error("plan has no tasks")]
    EmptyPlan,
    #[error("duplicate task id {0:?} in plan")]
    DuplicateTaskId(String),
    #[error("TaskResult must carry exactly one of result/error")]
    AmbiguousResult,
}

/// Immutable plan element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Task {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Task {
    /// Split `tool_call` into its `(server, tool)` segments.
    ///
    /// Returns `Ok(None)` when no tool call is set, `Ok(Some(..))` when it
    /// parses, and `Err` when it does not have exactly one `:` separator.
    pub fn tool_call_parts(&self) -> Result<Option<(&str, &str)>, DataModelError> {
        let Some(call) = self.tool_call.as_deref() else {
            return Ok(None);
        };
        let mut parts = call.splitn(2, ':');
        let server = parts.next().filter(|s| !s.is_empty());
        let tool = parts.next().filter(|s| !s.is_empty());
        match (server, tool) {
            (Some(server), Some(tool)) if !tool.contains(':') => Ok(Some((server, tool))),
            _ => Err(DataModelError::MalformedToolCall(call.to_string())),
        }
    }

    /// Validate this task against the set of task ids that precede it in
    /// the same plan.
    fn validate(&self, earlier_ids: &HashSet<&str>) -> Result<(), DataModelError> {
        self.tool_call_parts()?;
        for dep in &self.depends_on {
            if !earlier_ids.contains(dep.as_str()) {
                return Err(DataModelError::UnknownDependency(dep.clone()));
            }
        }
        Ok(())
    }
}

/// A non-empty, ordered sequence of [`Task`]s produced by the Planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub reasoning: String,
}

impl Plan {
    /// Validate the non-empty, unique-ids, forward-references-only
    /// invariants required of every plan the Planner emits.
    pub fn validate(&self) -> Result<(), DataModelError> {
        if self.tasks.is_empty() {
            return Err(DataModelError::EmptyPlan);
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(DataModelError::DuplicateTaskId(task.id.clone()));
            }
            task.validate(&seen.iter().copied().filter(|id| *id != task.id).collect())?;
        }
        Ok(())
    }

    pub fn task_at(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }
}

/// The outcome of executing exactly one [`Task`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskResult {
    pub task_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TaskResult {
    pub fn success(task_id: impl Into<String>, result: serde_json::Value) -> Self {
        Self { task_id: task_id.into(), success: true, result: Some(result), error: None, timestamp: Utc::now() }
    }

    pub fn failure(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self { task_id: task_id.into(), success: false, result: None, error: Some(error.into()), timestamp: Utc::now() }
    }
}

/// One of the three routing labels the Evaluator computes from state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Continue,
    Replan,
    Finalize,
}

/// A logged, non-persisted record of one Evaluator routing decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvaluationResult {
    pub decision: Decision,
    pub reasoning: String,
}

/// One opaque-to-the-caller entry in an [`AgentResponse`]'s execution
/// trace: enough to correlate task id, outcome and timing without
/// re-embedding the full result payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExecutionTraceEntry {
    pub task_id: String,
    pub success: bool,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&TaskResult> for ExecutionTraceEntry {
    fn from(result: &TaskResult) -> Self {
        const MAX_SUMMARY_LEN: usize = 160;
        let summary = match (&result.result, &result.error) {
            (Some(value), _) => value.to_string(),
            (None, Some(err)) => err.clone(),
            (None, None) => String::new(),
        };
        let summary = if summary.len() > MAX_SUMMARY_LEN {
            format!("{}…", &summary[..MAX_SUMMARY_LEN])
        } else {
            summary
        };
        Self { task_id: result.task_id.clone(), success: result.success, summary, timestamp: result.timestamp }
    }
}

/// The user-facing outcome of one completed `Invoke`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgentResponse {
    pub message: String,
    pub execution_trace: Vec<ExecutionTraceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_used: Option<Plan>,
}

/// The full session snapshot persisted by the checkpoint store between
/// `Invoke` calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgentState {
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub current_task_index: usize,
    #[serde(default)]
    pub execution_results: Vec<TaskResult>,
    /// Index into `execution_results` where the current `plan`'s results
    /// begin. Advanced by the Planner every time it installs a new plan,
    /// so routing logic can tell a fresh plan's results apart from a
    /// still-failed result left over from the plan that was just
    /// replaced.
    #[serde(default)]
    pub plan_started_at: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_response: Option<AgentResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            plan: None,
            current_task_index: 0,
            execution_results: Vec::new(),
            plan_started_at: 0,
            final_response: None,
            error: None,
        }
    }

    /// `final_response` set ⇒ the state is terminal.
    pub fn is_terminal(&self) -> bool {
        self.final_response.is_some()
    }

    /// `current_task_index ≤ len(plan.tasks)` when `plan` is set.
    pub fn index_within_bounds(&self) -> bool {
        match &self.plan {
            Some(plan) => self.current_task_index <= plan.tasks.len(),
            None => true,
        }
    }

    pub fn last_task_result(&self) -> Option<&TaskResult> {
        self.execution_results.last()
    }

    /// The `TaskResult`s produced under the currently installed `plan`,
    /// excluding whatever a previous, now-replaced plan left behind.
    pub fn current_plan_results(&self) -> &[TaskResult] {
        let start = self.plan_started_at.min(self.execution_results.len());
        &self.execution_results[start..]
    }

    /// The most recent `TaskResult` produced under the current plan, or
    /// `None` if the current plan has not executed any task yet.
    pub fn last_task_result_for_current_plan(&self) -> Option<&TaskResult> {
        self.current_plan_results().last()
    }

    pub fn with_user_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::Human { content: content.into() });
        self
    }
}
