//! Root orchestrator - drives a goal from a single root task to a verified
//! (or failed) task tree.
//!
//! # Responsibilities
//! 1. Create the root task and the run context
//! 2. Visit tasks depth-first, asking [`NodePlanner`] for each one
//! 3. Dispatch atomic tasks to the worker pool and verify their results
//! 4. Aggregate verified children into their parent and verify the aggregate
//! 5. Emit the run report to every sink
//!
//! # Traversal
//! An explicit stack replaces recursion. Children are pushed in reverse so
//! they pop in creation order, and a `Collect` frame below them pops only
//! after every child subtree is terminal:
//! ```text
//! Visit(root) -> [Collect(root), Visit(c3), Visit(c2), Visit(c1)]
//! ```

use tokio_util::sync::CancellationToken;

use crate::agents::context::{until_cancelled, RunContext};
use crate::agents::leaf::Verifier;
use crate::agents::pool::WorkerPool;
use crate::config::OrchestratorConfig;
use crate::oracle::OracleRef;
use crate::report::{emit_all, RunReport, SinkRef};
use crate::task::{
    CutReason, ExecutionPath, Task, TaskError, TaskId, TaskKind, TaskStatus, TaskTree,
};

use super::node::{NodePlanner, Plan};
use super::stats::Statistics;

/// Fatal orchestrator failures. Heuristic fallbacks never end up here.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Task {0} did not reach a terminal state")]
    NotTerminal(TaskId),
}

/// Outcome of [`Orchestrator::run_root`].
#[derive(Debug)]
pub struct RootOutcome {
    pub success: bool,
    pub root: Task,
    pub stats: Statistics,
    pub tree: TaskTree,
    pub report: RunReport,
}

enum Frame {
    Visit(TaskId),
    Collect(TaskId),
}

/// Recursive decomposition/execution orchestrator.
pub struct Orchestrator {
    config: OrchestratorConfig,
    planner: NodePlanner,
    pool: WorkerPool,
    verifier: Verifier,
    sinks: Vec<SinkRef>,
}

impl Orchestrator {
    pub fn new(oracle: OracleRef, config: OrchestratorConfig) -> Self {
        let config = config.normalized();
        Self {
            planner: NodePlanner::new(oracle.clone(), config.clone()),
            pool: WorkerPool::new(oracle.clone(), config.worker_count),
            verifier: Verifier::new(oracle),
            sinks: Vec::new(),
            config,
        }
    }

    /// Add a sink that receives the report of every run.
    pub fn with_sink(mut self, sink: SinkRef) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Decompose, execute and verify `description`.
    ///
    /// # Errors
    /// Only invariant violations of the task tree; oracle trouble is
    /// absorbed by the heuristics' fallbacks.
    pub async fn run_root(
        &self,
        description: impl Into<String>,
    ) -> Result<RootOutcome, OrchestratorError> {
        self.run(description.into(), RunContext::new()).await
    }

    /// Like [`run_root`](Self::run_root), aborting when `token` fires.
    ///
    /// Tasks still pending at cancellation end `Failed`, and so does every
    /// ancestor.
    pub async fn run_root_with_cancel(
        &self,
        description: impl Into<String>,
        token: CancellationToken,
    ) -> Result<RootOutcome, OrchestratorError> {
        self.run(description.into(), RunContext::new().with_cancel_token(token))
            .await
    }

    async fn run(
        &self,
        description: String,
        mut ctx: RunContext,
    ) -> Result<RootOutcome, OrchestratorError> {
        let root = ctx.tree.create(description, TaskKind::Root, 0, None)?.id();
        tracing::info!(run = %ctx.run_id, root = %root, "Starting run");

        let success = self.process(&mut ctx, root).await?;

        tracing::info!(
            total = ctx.stats.total_tasks,
            decomposed = ctx.stats.decomposed,
            direct = ctx.stats.executed_directly,
            max_level = ctx.stats.max_level_reached,
            "Decomposition statistics"
        );
        tracing::debug!("Task hierarchy:\n{}", ctx.tree.render_hierarchy());

        let report = RunReport::build(
            ctx.run_id,
            &ctx.tree,
            root,
            ctx.stats,
            ctx.started_at,
            self.config.result_preview_chars,
        )?;
        emit_all(&self.sinks, &report).await;

        Ok(RootOutcome {
            success,
            root: ctx.tree.get(root)?.clone(),
            stats: ctx.stats,
            tree: ctx.tree,
            report,
        })
    }

    /// Process the subtree rooted at `id` until every task in it is terminal.
    ///
    /// # Returns
    /// Whether `id` ended `Verified`.
    pub async fn process(&self, ctx: &mut RunContext, id: TaskId) -> Result<bool, OrchestratorError> {
        let mut stack = vec![Frame::Visit(id)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Visit(task_id) => {
                    if let Some(children) = self.visit(ctx, task_id).await? {
                        stack.push(Frame::Collect(task_id));
                        stack.extend(children.into_iter().rev().map(Frame::Visit));
                    }
                }
                Frame::Collect(parent) => self.collect(ctx, parent).await?,
            }
        }

        let task = ctx.tree.get(id)?;
        if !task.status().is_terminal() {
            return Err(OrchestratorError::NotTerminal(id));
        }
        Ok(task.is_verified())
    }

    /// Plan one task. Returns its new children when it was decomposed.
    async fn visit(
        &self,
        ctx: &mut RunContext,
        id: TaskId,
    ) -> Result<Option<Vec<TaskId>>, TaskError> {
        if ctx.is_cancelled() {
            ctx.tree.fail(id, "Cancelled before processing")?;
            return Ok(None);
        }

        let (level, description) = {
            let task = ctx.tree.get(id)?;
            (task.level(), task.description().to_string())
        };
        ctx.stats.record_visit(level);
        tracing::info!(task = %id, level, "Processing: {}", description);

        let plan = until_cancelled(ctx.cancel_token.clone(), self.planner.plan(&ctx.tree, id)).await;
        let Some(plan) = plan else {
            ctx.tree.fail(id, "Cancelled during planning")?;
            return Ok(None);
        };

        match plan? {
            Plan::Atomic(cut) => {
                self.execute_atomic(ctx, id, cut).await?;
                Ok(None)
            }
            Plan::Decompose(descriptions) => {
                ctx.stats.record_decomposed();
                ctx.tree.set_status(id, TaskStatus::Decomposed)?;
                ctx.tree.set_path(id, ExecutionPath::Decomposed)?;

                let total = descriptions.len();
                let mut children = Vec::with_capacity(total);
                for (idx, text) in descriptions.into_iter().enumerate() {
                    let child = ctx.tree.create(text, TaskKind::Branch, level + 1, Some(id))?.id();
                    tracing::info!(task = %id, "Created subtask {}/{}: {}", idx + 1, total, child);
                    children.push(child);
                }
                Ok(Some(children))
            }
        }
    }

    /// Execute a task directly on the next worker and verify the result.
    async fn execute_atomic(
        &self,
        ctx: &mut RunContext,
        id: TaskId,
        cut: CutReason,
    ) -> Result<(), TaskError> {
        if ctx.is_cancelled() {
            return ctx.tree.fail(id, "Cancelled before execution");
        }
        ctx.stats.record_direct();

        tracing::debug!(task = %id, "Executing directly: {}", cut);
        ctx.tree.set_path(id, ExecutionPath::Atomic { cut })?;
        ctx.tree.set_status(id, TaskStatus::InProgress)?;

        let context = ctx.execution_context(id, self.config.sibling_context_chars)?;
        let worker = self.pool.next_worker();
        let result = until_cancelled(
            ctx.cancel_token.clone(),
            worker.execute(ctx.tree.get(id)?, &context),
        )
        .await;
        let Some(result) = result else {
            return ctx.tree.fail(id, "Cancelled during execution");
        };

        ctx.tree.set_result(id, result)?;
        ctx.tree.set_status(id, TaskStatus::Completed)?;
        self.verify(ctx, id).await
    }

    /// Aggregate a decomposed task once all its children are terminal.
    async fn collect(&self, ctx: &mut RunContext, id: TaskId) -> Result<(), TaskError> {
        let (total, failed) = {
            let children = ctx.tree.children_of(id)?;
            let failed: Vec<TaskId> = children
                .iter()
                .filter(|c| !c.is_verified())
                .map(|c| c.id())
                .collect();
            (children.len(), failed)
        };

        if !failed.is_empty() {
            let ids = failed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(task = %id, "{} of {} subtasks failed: {}", failed.len(), total, ids);
            return ctx
                .tree
                .fail(id, format!("{} of {} subtasks failed: {}", failed.len(), total, ids));
        }

        let aggregate = aggregate_results(&ctx.tree, id)?;
        ctx.tree.set_result(id, aggregate)?;
        ctx.tree.set_status(id, TaskStatus::Completed)?;
        self.verify(ctx, id).await
    }

    /// Verify a completed task and move it to `Verified` or `Failed`.
    async fn verify(&self, ctx: &mut RunContext, id: TaskId) -> Result<(), TaskError> {
        let verification = until_cancelled(
            ctx.cancel_token.clone(),
            self.verifier.verify(ctx.tree.get(id)?),
        )
        .await;
        let Some(verification) = verification else {
            return ctx.tree.fail(id, "Cancelled during verification");
        };

        let next = if verification.passed {
            TaskStatus::Verified
        } else {
            TaskStatus::Failed
        };
        ctx.tree.set_verification(id, verification)?;
        ctx.tree.set_status(id, next)
    }
}

/// Concatenate the children's results, tagged with their ids, in order.
fn aggregate_results(tree: &TaskTree, id: TaskId) -> Result<String, TaskError> {
    let task = tree.get(id)?;
    let children = tree.children_of(id)?;
    let parts = children
        .iter()
        .filter_map(|c| c.result().map(|r| format!("[{}] {}", c.id(), r)))
        .collect::<Vec<_>>();

    Ok(format!(
        "Task '{}' was completed through {} subtasks:\n\n{}",
        task.description(),
        children.len(),
        parts.join("\n\n")
    ))
}
