//! Run reports and the sinks they are emitted to.
//!
//! After a root task reaches a terminal state the orchestrator builds one
//! [`RunReport`] and hands it to every configured [`ReportSink`]. How and
//! where a sink stores it is the sink's business.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::agents::orchestrator::Statistics;
use crate::task::{
    ExecutionPath, FailureNote, TaskError, TaskId, TaskKind, TaskStatus, TaskTree, Verification,
};
use crate::util::preview;

/// Nested view of one task and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub description: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub level: u32,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<ExecutionPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_preview: Option<String>,
    pub children: Vec<TaskSnapshot>,
}

impl TaskSnapshot {
    /// Snapshot the subtree rooted at `id`.
    pub fn capture(tree: &TaskTree, id: TaskId, preview_chars: usize) -> Result<Self, TaskError> {
        let task = tree.get(id)?;
        let children = task
            .children()
            .iter()
            .map(|child| Self::capture(tree, *child, preview_chars))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            description: task.description().to_string(),
            kind: task.kind(),
            status: task.status(),
            level: task.level(),
            verified: task.is_verified(),
            path: task.path().cloned(),
            score: task.verification().map(|v| v.score),
            result_preview: task.result().map(|r| preview(r, preview_chars)),
            children,
        })
    }

    /// Number of tasks in this subtree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

/// Everything a persistence collaborator needs about a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub root_id: TaskId,
    pub description: String,
    pub success: bool,
    pub final_result: Option<String>,
    pub stats: Statistics,
    pub decomposition_ratio: f64,
    pub root_verification: Option<Verification>,
    pub tree: TaskSnapshot,
    /// Tasks whose rejection explains a failed root; empty on success
    pub failures: Vec<FailureNote>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub fn build(
        run_id: Uuid,
        tree: &TaskTree,
        root: TaskId,
        stats: Statistics,
        started_at: DateTime<Utc>,
        preview_chars: usize,
    ) -> Result<Self, TaskError> {
        let task = tree.get(root)?;
        let finished_at = Utc::now();
        let elapsed_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

        Ok(Self {
            run_id,
            root_id: root,
            description: task.description().to_string(),
            success: task.is_verified(),
            final_result: task.result().map(str::to_string),
            stats,
            decomposition_ratio: stats.decomposition_ratio(),
            root_verification: task.verification().cloned(),
            tree: TaskSnapshot::capture(tree, root, preview_chars)?,
            failures: tree.failure_trail(root)?,
            started_at,
            finished_at,
            elapsed_ms,
        })
    }
}

/// Receiver of finished run reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;

    async fn emit(&self, report: &RunReport) -> anyhow::Result<()>;
}

pub type SinkRef = Arc<dyn ReportSink>;

/// Keeps every report in memory.
#[derive(Default)]
pub struct MemorySink {
    reports: Mutex<Vec<RunReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reports(&self) -> Vec<RunReport> {
        self.reports.lock().await.clone()
    }
}

#[async_trait]
impl ReportSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn emit(&self, report: &RunReport) -> anyhow::Result<()> {
        self.reports.lock().await.push(report.clone());
        Ok(())
    }
}

/// Logs a one-line summary plus one line per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl ReportSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn emit(&self, report: &RunReport) -> anyhow::Result<()> {
        tracing::info!(
            run = %report.run_id,
            root = %report.root_id,
            success = report.success,
            total = report.stats.total_tasks,
            decomposed = report.stats.decomposed,
            direct = report.stats.executed_directly,
            max_level = report.stats.max_level_reached,
            elapsed_ms = report.elapsed_ms,
            "Run finished: {:.0}% of tasks needed splitting",
            report.decomposition_ratio * 100.0
        );
        for failure in &report.failures {
            tracing::warn!(
                task = %failure.task_id,
                level = failure.level,
                "Rejected: {}",
                failure.feedback
            );
        }
        Ok(())
    }
}

/// Hand `report` to every sink; failures are logged, never propagated.
pub async fn emit_all(sinks: &[SinkRef], report: &RunReport) {
    for sink in sinks {
        if let Err(e) = sink.emit(report).await {
            tracing::error!(sink = sink.name(), "Failed to emit run report: {:#}", e);
        }
    }
}
