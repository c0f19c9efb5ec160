//! Task module - tasks, their verification records and the owning tree.
//!
//! This module is designed with formal verification in mind:
//! - Status changes are explicit and validated against a state machine
//! - Write-once fields are enforced by the tree, not by callers
//! - Pure data types are separated from the orchestration that drives them

pub mod task;
mod tree;
mod verification;

pub use task::{CutReason, ExecutionPath, Task, TaskError, TaskId, TaskKind, TaskStatus};
pub use tree::{FailureNote, TaskTree};
pub use verification::{
    ValueAssessment, Verification, DEFAULT_SCORE, MAX_SCORE, MIN_SCORE,
};
