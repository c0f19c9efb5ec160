//! Execution worker: carries out an atomic task.

use crate::agents::prompts::{execution_prompt, ExecutionContext, EXECUTION_SYSTEM};
use crate::oracle::OracleRef;
use crate::task::Task;

/// One member of the worker pool.
///
/// Workers are interchangeable; `index` only labels log lines.
pub struct ExecutionWorker {
    index: usize,
    oracle: OracleRef,
}

impl ExecutionWorker {
    pub fn new(index: usize, oracle: OracleRef) -> Self {
        Self { index, oracle }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Execute `task` with `context` and return its result text.
    ///
    /// # Postconditions
    /// - Never fails: an unavailable oracle yields an empty result, which
    ///   the value-added filter rejects downstream
    pub async fn execute(&self, task: &Task, context: &ExecutionContext) -> String {
        tracing::info!(task = %task.id(), worker = self.index, "Executing task");

        match self
            .oracle
            .ask(EXECUTION_SYSTEM, &execution_prompt(task, context))
            .await
        {
            Ok(result) => {
                tracing::debug!(task = %task.id(), chars = result.len(), "Execution finished");
                result
            }
            Err(e) => {
                tracing::error!(task = %task.id(), worker = self.index, "Execution failed: {}", e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskKind, TaskTree};
    use crate::test_support::ScriptedOracle;

    #[tokio::test]
    async fn test_execute_passes_context() {
        let oracle = ScriptedOracle::new().result("Write intro", "Intro text");
        let worker = ExecutionWorker::new(1, oracle.handle());
        let mut tree = TaskTree::new();
        let id = tree.create("Write intro", TaskKind::Root, 0, None).unwrap().id();

        let context = ExecutionContext {
            parent: Some("Write article".to_string()),
            siblings: Vec::new(),
        };
        let result = worker.execute(tree.get(id).unwrap(), &context).await;

        assert_eq!(result, "Intro text");
        let calls = oracle.calls();
        assert!(calls[0].1.contains("parent_task: Write article"));
    }

    #[tokio::test]
    async fn test_outage_yields_empty_result() {
        let oracle = ScriptedOracle::new().unavailable(EXECUTION_SYSTEM);
        let worker = ExecutionWorker::new(2, oracle.handle());
        let mut tree = TaskTree::new();
        let id = tree.create("Write intro", TaskKind::Root, 0, None).unwrap().id();

        let result = worker.execute(tree.get(id).unwrap(), &ExecutionContext::default()).await;
        assert!(result.is_empty());
    }
}
