//! Task tree: the owning container for every task in a run.
//!
//! # Structure
//! - Root tasks at level 0, children one level below their parent
//! - Children listed in creation order; lists only grow
//!
//! # Invariants
//! - Ids are assigned monotonically and never reused
//! - No task is re-parented or removed
//! - `result` and `verification` are write-once, `verification` after `result`
//! - Status changes follow [`TaskStatus::can_transition_to`]

use std::collections::BTreeMap;

use serde::Serialize;

use super::task::{ExecutionPath, Task, TaskError, TaskId, TaskKind, TaskStatus};
use super::verification::Verification;
use crate::util::truncate_chars;

/// Width of the description shown per line in [`TaskTree::render_hierarchy`].
const OUTLINE_DESCRIPTION_CHARS: usize = 60;

/// Why a task in a failed subtree was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureNote {
    pub task_id: TaskId,
    pub level: u32,
    pub description: String,
    pub feedback: String,
    pub issues: Vec<String>,
}

/// Arena of tasks indexed by id.
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    tasks: BTreeMap<TaskId, Task>,
    last_seq: u64,
}

impl TaskTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a task and attach it to its parent.
    ///
    /// # Preconditions
    /// - `description` is non-empty
    /// - `parent`, if set, exists and `level == parent.level + 1`
    /// - without a parent, `level == 0`
    ///
    /// # Postconditions
    /// - The new id is greater than every id issued before
    /// - The new id is the last entry of `parent.children`
    pub fn create(
        &mut self,
        description: impl Into<String>,
        kind: TaskKind,
        level: u32,
        parent: Option<TaskId>,
    ) -> Result<&Task, TaskError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(TaskError::EmptyDescription);
        }

        let expected = match parent {
            Some(parent_id) => {
                let parent = self
                    .tasks
                    .get(&parent_id)
                    .ok_or(TaskError::ParentNotFound(parent_id))?;
                parent.level() + 1
            }
            None => 0,
        };
        if level != expected {
            return Err(TaskError::LevelMismatch {
                expected,
                actual: level,
            });
        }

        self.last_seq += 1;
        let id = TaskId::new(self.last_seq);

        if let Some(parent_id) = parent {
            if let Some(parent) = self.tasks.get_mut(&parent_id) {
                parent.push_child(id);
            }
        }

        let task = self
            .tasks
            .entry(id)
            .or_insert_with(|| Task::new(id, description, kind, level, parent));
        Ok(&*task)
    }

    /// Get a task by id.
    pub fn get(&self, id: TaskId) -> Result<&Task, TaskError> {
        self.tasks.get(&id).ok_or(TaskError::NotFound(id))
    }

    fn get_mut(&mut self, id: TaskId) -> Result<&mut Task, TaskError> {
        self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))
    }

    /// Move a task to `status`.
    ///
    /// # Errors
    /// `InvalidStateTransition` if the state machine forbids the move.
    pub fn set_status(&mut self, id: TaskId, status: TaskStatus) -> Result<(), TaskError> {
        let task = self.get_mut(id)?;
        let from = task.status();
        if !from.can_transition_to(status) {
            return Err(TaskError::InvalidStateTransition {
                task: id,
                from,
                to: status,
            });
        }
        task.set_status(status);
        Ok(())
    }

    /// Write the task's result.
    ///
    /// # Errors
    /// `ResultAlreadySet` on a second write.
    pub fn set_result(&mut self, id: TaskId, result: impl Into<String>) -> Result<(), TaskError> {
        let task = self.get_mut(id)?;
        if task.result().is_some() {
            return Err(TaskError::ResultAlreadySet(id));
        }
        task.set_result(result.into());
        Ok(())
    }

    /// Write the task's verification record.
    ///
    /// # Errors
    /// - `VerificationBeforeResult` if no result was written yet
    /// - `VerificationAlreadySet` on a second write
    pub fn set_verification(
        &mut self,
        id: TaskId,
        verification: Verification,
    ) -> Result<(), TaskError> {
        let task = self.get_mut(id)?;
        if task.result().is_none() {
            return Err(TaskError::VerificationBeforeResult(id));
        }
        if task.verification().is_some() {
            return Err(TaskError::VerificationAlreadySet(id));
        }
        task.set_verification(verification);
        Ok(())
    }

    /// Record which execution path the orchestrator took.
    pub fn set_path(&mut self, id: TaskId, path: ExecutionPath) -> Result<(), TaskError> {
        self.get_mut(id)?.set_path(path);
        Ok(())
    }

    /// Move a task to `Failed` and record why.
    ///
    /// Used when no verification explains the failure (child failure,
    /// cancellation).
    pub fn fail(&mut self, id: TaskId, reason: impl Into<String>) -> Result<(), TaskError> {
        self.set_status(id, TaskStatus::Failed)?;
        self.get_mut(id)?.set_failure(reason.into());
        Ok(())
    }

    /// Children of a task, in creation order.
    pub fn children_of(&self, id: TaskId) -> Result<Vec<&Task>, TaskError> {
        self.get(id)?
            .children()
            .iter()
            .map(|child| self.get(*child))
            .collect()
    }

    /// Ancestors from the immediate parent up to the root.
    pub fn ancestors_of(&self, id: TaskId) -> Result<Vec<&Task>, TaskError> {
        let mut ancestors = Vec::new();
        let mut current = self.get(id)?;
        while let Some(parent_id) = current.parent() {
            let parent = self.get(parent_id)?;
            ancestors.push(parent);
            current = parent;
        }
        Ok(ancestors)
    }

    /// All tasks at a given depth, ordered by id.
    pub fn tasks_at_level(&self, level: u32) -> Vec<&Task> {
        self.tasks.values().filter(|t| t.level() == level).collect()
    }

    /// Tasks without a parent, ordered by id.
    pub fn roots(&self) -> Vec<&Task> {
        self.tasks.values().filter(|t| t.is_root()).collect()
    }

    /// Iterate over all tasks, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Depth-first pre-order walk of a subtree, children in creation order.
    pub fn walk(&self, root: TaskId) -> Result<Vec<&Task>, TaskError> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let task = self.get(id)?;
            stack.extend(task.children().iter().rev().copied());
            out.push(task);
        }
        Ok(out)
    }

    /// Tasks in a subtree that explain its failure.
    ///
    /// A failed task contributes a note when its own verification rejected
    /// it, or when it failed without a verdict and none of its children
    /// failed (cancellation). Branches that failed only because a child did
    /// are skipped; the child carries the cause.
    pub fn failure_trail(&self, root: TaskId) -> Result<Vec<FailureNote>, TaskError> {
        let mut notes = Vec::new();
        for task in self.walk(root)? {
            if task.status() != TaskStatus::Failed {
                continue;
            }
            let note = match (task.verification(), task.failure()) {
                (Some(v), _) if !v.passed => Some((v.feedback.clone(), v.issues.clone())),
                (_, Some(reason)) => {
                    let child_failed = task
                        .children()
                        .iter()
                        .filter_map(|c| self.tasks.get(c))
                        .any(|c| c.status() == TaskStatus::Failed);
                    (!child_failed).then(|| (reason.to_string(), Vec::new()))
                }
                _ => None,
            };
            if let Some((feedback, issues)) = note {
                notes.push(FailureNote {
                    task_id: task.id(),
                    level: task.level(),
                    description: task.description().to_string(),
                    feedback,
                    issues,
                });
            }
        }
        Ok(notes)
    }

    /// Indented outline of every root's subtree with status markers.
    pub fn render_hierarchy(&self) -> String {
        let mut out = String::new();
        for root in self.roots() {
            let Ok(tasks) = self.walk(root.id()) else {
                continue;
            };
            for task in tasks {
                let description = task.description();
                let shown = truncate_chars(description, OUTLINE_DESCRIPTION_CHARS);
                let ellipsis = if shown.len() < description.len() { "..." } else { "" };
                out.push_str(&format!(
                    "{}{} [{}] {}{}\n",
                    "  ".repeat(task.level() as usize),
                    task.status().symbol(),
                    task.id(),
                    shown,
                    ellipsis
                ));
            }
        }
        out
    }
}
