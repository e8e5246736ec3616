//! Data model, planner/executor/evaluator/finalizer nodes, and the
//! agent graph that wires them into the plan/execute/evaluate/finalize
//! state machine described in the orchestration engine's design.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod graph;
pub mod nodes;

pub use agentic_types::{
    AgentResponse, AgentState, Decision, EvaluationResult, ExecutionTraceEntry, Message, Plan, Task, TaskResult,
};
pub use checkpoint::{CheckpointError, CheckpointStore, InMemoryCheckpointStore};
pub use config::AgentConfig;
pub use error::AgentError;
pub use graph::Agent;
