//! Core Task type and its lifecycle.
//!
//! # Invariants
//! - `id` is unique within one task tree and never reused
//! - `level == parent.level + 1`, or `0` for a root
//! - `result` is written at most once
//! - `verification` is written at most once, and only after `result`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::verification::Verification;

/// Unique identifier for a task.
///
/// # Properties
/// - Assigned monotonically by the owning [`TaskTree`](super::TaskTree)
/// - Immutable once created
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Sequence number inside the owning tree.
    pub fn seq(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task_{:04}", self.0)
    }
}

/// Structural classification of a task, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Top-level goal (level 0)
    Root,
    /// Produced by decomposition; may decompose further
    Branch,
    /// Known to be atomic when created
    Leaf,
}

/// Status of a task in its lifecycle.
///
/// # State Machine
/// ```text
/// Created -> Decomposed -> Completed -> Verified
///        \-> InProgress -/           \-> Failed
/// ```
/// Any non-terminal state may also move to `Failed` (child failure,
/// cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Created,
    Decomposed,
    InProgress,
    Completed,
    Verified,
    Failed,
}

impl TaskStatus {
    /// Check if the task is in a terminal state.
    ///
    /// # Property
    /// `is_terminal() => !can_transition_to(x)` for every `x`
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Verified | TaskStatus::Failed)
    }

    /// Whether the state machine allows `self -> next`.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::{Completed, Created, Decomposed, Failed, InProgress, Verified};

        match (self, next) {
            (Created, Decomposed | InProgress | Failed) => true,
            (Decomposed, Completed | Failed) => true,
            (InProgress, Completed | Failed) => true,
            (Completed, Verified | Failed) => true,
            _ => false,
        }
    }

    /// Single-character marker used by the hierarchy outline.
    pub fn symbol(&self) -> &'static str {
        match self {
            TaskStatus::Created => "○",
            TaskStatus::Decomposed => "◐",
            TaskStatus::InProgress => "◑",
            TaskStatus::Completed => "●",
            TaskStatus::Verified => "✓",
            TaskStatus::Failed => "✗",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskStatus::Created => "created",
            TaskStatus::Decomposed => "decomposed",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Verified => "verified",
            TaskStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a task was executed atomically instead of being decomposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CutReason {
    /// Level exceeded the configured heuristic depth
    DepthGuard { level: u32, max: u32 },
    /// Level reached the absolute safety ceiling
    SafetyCeiling { level: u32, ceiling: u32 },
    /// Complexity gate judged the task simple enough
    SimpleEnough,
    /// Decomposition produced no subtasks
    EmptyDecomposition,
    /// Duplicate elimination left no usable subtasks
    NoUniqueSubtasks,
    /// Task repeats an ancestor's goal
    SemanticLoop { ancestor: TaskId, similarity: u8 },
    /// Task was created with `TaskKind::Leaf`
    LeafKind,
}

impl std::fmt::Display for CutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CutReason::DepthGuard { level, max } => {
                write!(f, "depth guard (level {} > {})", level, max)
            }
            CutReason::SafetyCeiling { level, ceiling } => {
                write!(f, "safety ceiling (level {} >= {})", level, ceiling)
            }
            CutReason::SimpleEnough => f.write_str("simple enough to execute directly"),
            CutReason::EmptyDecomposition => f.write_str("decomposition produced no subtasks"),
            CutReason::NoUniqueSubtasks => f.write_str("no unique subtasks after merging"),
            CutReason::SemanticLoop {
                ancestor,
                similarity,
            } => write!(f, "semantic loop with {} (similarity {})", ancestor, similarity),
            CutReason::LeafKind => f.write_str("leaf task"),
        }
    }
}

/// Which path the orchestrator actually took for a task.
///
/// Kept separate from [`TaskKind`]: a branch forced to run atomically keeps
/// its kind and records the cut here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum ExecutionPath {
    Decomposed,
    Atomic { cut: CutReason },
}

/// A unit of work in the task tree.
///
/// Fields are private; mutation goes through [`TaskTree`](super::TaskTree),
/// which enforces the write-once and ordering rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    description: String,
    kind: TaskKind,
    status: TaskStatus,
    level: u32,
    parent: Option<TaskId>,
    children: Vec<TaskId>,
    result: Option<String>,
    verification: Option<Verification>,
    path: Option<ExecutionPath>,
    failure: Option<String>,
    created_at: DateTime<Utc>,
}

impl Task {
    pub(super) fn new(
        id: TaskId,
        description: String,
        kind: TaskKind,
        level: u32,
        parent: Option<TaskId>,
    ) -> Self {
        Self {
            id,
            description,
            kind,
            status: TaskStatus::Created,
            level,
            parent,
            children: Vec::new(),
            result: None,
            verification: None,
            path: None,
            failure: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn parent(&self) -> Option<TaskId> {
        self.parent
    }

    pub fn children(&self) -> &[TaskId] {
        &self.children
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn verification(&self) -> Option<&Verification> {
        self.verification.as_ref()
    }

    pub fn path(&self) -> Option<&ExecutionPath> {
        self.path.as_ref()
    }

    /// Why the task failed when no verification explains it
    /// (child failure, cancellation).
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_verified(&self) -> bool {
        self.status == TaskStatus::Verified
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    // Mutators are tree-private; the tree validates before calling them.

    pub(super) fn push_child(&mut self, child: TaskId) {
        self.children.push(child);
    }

    pub(super) fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    pub(super) fn set_result(&mut self, result: String) {
        self.result = Some(result);
    }

    pub(super) fn set_verification(&mut self, verification: Verification) {
        self.verification = Some(verification);
    }

    pub(super) fn set_path(&mut self, path: ExecutionPath) {
        self.path = Some(path);
    }

    pub(super) fn set_failure(&mut self, reason: String) {
        self.failure = Some(reason);
    }
}

/// Errors raised by task tree operations.
///
/// All of these are programming-invariant violations and are fatal to a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    #[error("Task description cannot be empty")]
    EmptyDescription,

    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Parent task not found: {0}")]
    ParentNotFound(TaskId),

    #[error("Level mismatch: expected {expected}, got {actual}")]
    LevelMismatch { expected: u32, actual: u32 },

    #[error("Invalid state transition for {task}: {from} -> {to}")]
    InvalidStateTransition {
        task: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Invalid state transition for {0}: result already set")]
    ResultAlreadySet(TaskId),

    #[error("Invalid state transition for {0}: verification requires a result")]
    VerificationBeforeResult(TaskId),

    #[error("Invalid state transition for {0}: verification already set")]
    VerificationAlreadySet(TaskId),
}

impl TaskError {
    /// Whether this is an illegal status change or a write-once violation.
    pub fn is_invalid_state_transition(&self) -> bool {
        matches!(
            self,
            Self::InvalidStateTransition { .. }
                | Self::ResultAlreadySet(_)
                | Self::VerificationBeforeResult(_)
                | Self::VerificationAlreadySet(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_display() {
        assert_eq!(TaskId::new(7).to_string(), "task_0007");
        assert_eq!(TaskId::new(12345).to_string(), "task_12345");
    }

    #[test]
    fn test_state_machine() {
        use TaskStatus::*;

        assert!(Created.can_transition_to(Decomposed));
        assert!(Created.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Verified));
        assert!(Decomposed.can_transition_to(Failed));

        assert!(!Created.can_transition_to(Completed));
        assert!(!Decomposed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(InProgress));

        for next in [Created, Decomposed, InProgress, Completed, Verified, Failed] {
            assert!(!Verified.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
    }
}
