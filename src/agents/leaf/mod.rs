//! Leaf agents - the heuristics and workers the orchestrator consults.
//!
//! # Cut heuristics (in the order they are applied)
//! - `ComplexityAnalyzer`: split or execute directly, and how many subtasks
//! - `Decomposer`: proposes subtask descriptions
//! - `DuplicateMerger`: collapses overlapping subtasks
//! - `LoopDetector`: refuses decomposition that repeats an ancestor
//! - `ValueAddedFilter`: rejects instruction-only results (inside `Verifier`)
//!
//! # Workers
//! - `ExecutionWorker`: executes atomic tasks
//! - `Verifier`: judges every result

mod complexity;
mod decomposer;
mod dedup;
mod executor;
mod loop_detector;
mod value_filter;
mod verifier;

pub use complexity::ComplexityAnalyzer;
pub use decomposer::Decomposer;
pub use dedup::DuplicateMerger;
pub use executor::ExecutionWorker;
pub use loop_detector::{LoopDetector, LoopMatch};
pub use value_filter::{ValueAddedFilter, MIN_RESULT_CHARS};
pub use verifier::Verifier;
