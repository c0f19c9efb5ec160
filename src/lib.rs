//! # taskfold
//!
//! Recursive task decomposition orchestrator.
//!
//! A goal is split into subtasks by an external reasoning oracle, subtasks
//! are split further while that still makes sense, the leaves are executed
//! and every result is verified before it is aggregated upward.
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │          Orchestrator            │
//!        │  (explicit depth-first worklist) │
//!        └───────┬───────────────┬──────────┘
//!                │               │
//!                ▼               ▼
//!        ┌──────────────┐ ┌──────────────┐
//!        │ NodePlanner  │ │  WorkerPool  │
//!        │ cut heuristics│ │  + Verifier  │
//!        └──────┬───────┘ └──────┬───────┘
//!               └───────┬────────┘
//!                       ▼
//!                ┌─────────────┐
//!                │   Oracle    │
//!                └─────────────┘
//! ```
//!
//! ## Task Flow
//! 1. Create the root task from the goal
//! 2. Plan: decompose, or execute atomically when a cut heuristic fires
//! 3. Execute leaves with parent and sibling context
//! 4. Verify each result; aggregate verified children into the parent
//! 5. Emit a run report to the configured sinks
//!
//! ## Modules
//! - `agents`: orchestrator, planner heuristics, workers, prompts
//! - `task`: task model, state machine and the task tree arena
//! - `oracle`: the reasoning capability and its answer parsers
//! - `llm`: HTTP chat completions oracle with retry
//! - `report`: run reports and sinks

pub mod agents;
pub mod config;
pub mod llm;
pub mod oracle;
pub mod report;
pub mod task;
pub mod util;

#[cfg(test)]
mod test_support;

pub use agents::{Orchestrator, OrchestratorError, RootOutcome, Statistics};
pub use config::Config;
pub use oracle::{Oracle, OracleError, OracleRef};
pub use report::{LogSink, MemorySink, ReportSink, RunReport};
pub use task::{Task, TaskId, TaskKind, TaskStatus, TaskTree};
