//! Agents module - everything that acts on the task tree.
//!
//! # Layout
//! - `orchestrator`: the control loop (`Orchestrator`), per-task planning
//!   (`NodePlanner`) and run statistics
//! - `leaf`: cut heuristics, the execution worker and the verifier
//! - `pool`: round-robin dispatch of atomic tasks to workers
//! - `prompts`: every system prompt and user prompt builder
//! - `context`: the per-run mutable state (`RunContext`)
//!
//! # Design Principles
//! - Every oracle judgement has a documented fallback; oracle trouble never
//!   fails a run
//! - Tree invariant violations always do

mod context;
pub mod leaf;
pub mod orchestrator;
pub mod pool;
pub mod prompts;

pub use context::{until_cancelled, RunContext};
pub use orchestrator::{Orchestrator, OrchestratorError, RootOutcome, Statistics};
pub use pool::WorkerPool;
pub use prompts::ExecutionContext;
