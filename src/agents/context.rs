//! Run context - the mutable state of one top-level invocation.

use std::future::Future;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::agents::orchestrator::Statistics;
use crate::agents::prompts::ExecutionContext;
use crate::task::{TaskError, TaskId, TaskStatus, TaskTree};
use crate::util::truncate_chars;

/// State owned by one run and passed by `&mut` through the control loop.
///
/// # Ownership
/// The tree and the counters belong to exactly one run; nothing else
/// writes them while the run is in progress.
pub struct RunContext {
    pub run_id: Uuid,

    pub tree: TaskTree,

    pub stats: Statistics,

    /// Optional cancellation token for cooperative cancellation.
    pub cancel_token: Option<CancellationToken>,

    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            tree: TaskTree::new(),
            stats: Statistics::new(),
            cancel_token: None,
            started_at: Utc::now(),
        }
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Check if cooperative cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .map(|t| t.is_cancelled())
            .unwrap_or(false)
    }

    /// Context for executing `id` atomically: the parent's description and
    /// the results of siblings that already completed, each cut to
    /// `sibling_chars` characters.
    pub fn execution_context(
        &self,
        id: TaskId,
        sibling_chars: usize,
    ) -> Result<ExecutionContext, TaskError> {
        let task = self.tree.get(id)?;
        let Some(parent_id) = task.parent() else {
            return Ok(ExecutionContext::default());
        };
        let parent = self.tree.get(parent_id)?;

        let siblings = self
            .tree
            .children_of(parent_id)?
            .into_iter()
            .filter(|s| s.id() != id)
            .filter(|s| matches!(s.status(), TaskStatus::Completed | TaskStatus::Verified))
            .filter_map(|s| {
                s.result()
                    .map(|r| (s.id(), truncate_chars(r, sibling_chars).to_string()))
            })
            .collect();

        Ok(ExecutionContext {
            parent: Some(parent.description().to_string()),
            siblings,
        })
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive `fut` to completion unless `token` fires first.
///
/// Returns `None` when cancelled. The token is polled first, so a call that
/// completes in the same poll as a cancellation still counts as cancelled.
pub async fn until_cancelled<F: Future>(
    token: Option<CancellationToken>,
    fut: F,
) -> Option<F::Output> {
    match token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => None,
            out = fut => Some(out),
        },
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskKind;

    #[test]
    fn test_execution_context_collects_completed_siblings() {
        let mut ctx = RunContext::new();
        let root = ctx.tree.create("Write a report", TaskKind::Root, 0, None).unwrap().id();
        let first = ctx
            .tree
            .create("Collect data", TaskKind::Branch, 1, Some(root))
            .unwrap()
            .id();
        let second = ctx
            .tree
            .create("Draft sections", TaskKind::Branch, 1, Some(root))
            .unwrap()
            .id();
        let third = ctx
            .tree
            .create("Proofread", TaskKind::Branch, 1, Some(root))
            .unwrap()
            .id();

        ctx.tree.set_status(first, TaskStatus::InProgress).unwrap();
        ctx.tree.set_result(first, "x".repeat(500)).unwrap();
        ctx.tree.set_status(first, TaskStatus::Completed).unwrap();

        let context = ctx.execution_context(second, 200).unwrap();
        assert_eq!(context.parent.as_deref(), Some("Write a report"));
        assert_eq!(context.siblings.len(), 1);
        assert_eq!(context.siblings[0].0, first);
        assert_eq!(context.siblings[0].1.len(), 200);

        // not-yet-run siblings contribute nothing
        assert!(context.siblings.iter().all(|(id, _)| *id != third));
    }

    #[test]
    fn test_root_has_empty_context() {
        let mut ctx = RunContext::new();
        let root = ctx.tree.create("Goal", TaskKind::Root, 0, None).unwrap().id();
        assert!(ctx.execution_context(root, 200).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_until_cancelled() {
        let token = CancellationToken::new();
        assert_eq!(until_cancelled(Some(token.clone()), async { 7 }).await, Some(7));

        token.cancel();
        let pending = std::future::pending::<u32>();
        assert_eq!(until_cancelled(Some(token), pending).await, None);
        assert_eq!(until_cancelled(None, async { 1 }).await, Some(1));
    }

    #[tokio::test]
    async fn test_cancellation_wins_over_ready_future() {
        let token = CancellationToken::new();
        token.cancel();
        for _ in 0..32 {
            assert_eq!(until_cancelled(Some(token.clone()), async { 7 }).await, None);
        }
    }
}
