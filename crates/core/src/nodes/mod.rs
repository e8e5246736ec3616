//! The four pure state transitions the graph wires together: Planner,
//! Executor, Evaluator, Finalizer. None of them mutate the `AgentState`
//! they are handed; each returns a new one.

pub mod evaluator;
pub mod executor;
pub mod finalizer;
pub mod planner;

pub use evaluator::evaluate;
pub use executor::execute;
pub use finalizer::finalize;
pub use planner::plan;
