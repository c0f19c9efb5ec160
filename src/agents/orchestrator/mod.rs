//! Orchestrator - the decomposition/execution control loop.

mod node;
mod root;
mod stats;

pub use node::{NodePlanner, Plan};
pub use root::{Orchestrator, OrchestratorError, RootOutcome};
pub use stats::Statistics;
