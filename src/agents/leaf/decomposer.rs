//! Decomposer: turns a task into candidate subtask descriptions.

use crate::agents::prompts::{decomposition_prompt, DECOMPOSITION_SYSTEM};
use crate::oracle::{parse_subtask_list, OracleRef};
use crate::task::Task;

pub struct Decomposer {
    oracle: OracleRef,
}

impl Decomposer {
    pub fn new(oracle: OracleRef) -> Self {
        Self { oracle }
    }

    /// Request `count` subtask descriptions for `task`.
    ///
    /// # Postconditions
    /// - `result.len() <= count`
    /// - empty when `count <= 1`, on outage, or when no list line was found
    pub async fn decompose(&self, task: &Task, parent: Option<&Task>, count: usize) -> Vec<String> {
        if count <= 1 {
            tracing::info!(task = %task.id(), count, "Single subtask requested, task is atomic");
            return Vec::new();
        }

        let prompt = decomposition_prompt(task, parent, count);
        let answer = match self.oracle.ask(DECOMPOSITION_SYSTEM, &prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(task = %task.id(), "Decomposition unavailable: {}", e);
                return Vec::new();
            }
        };

        let subtasks = parse_subtask_list(&answer, count);
        tracing::info!(
            task = %task.id(),
            requested = count,
            produced = subtasks.len(),
            "Decomposed task"
        );
        subtasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskKind, TaskTree};
    use crate::test_support::ScriptedOracle;

    #[tokio::test]
    async fn test_decompose_truncates_to_count() {
        let oracle = ScriptedOracle::new().subtasks("Goal", &["A one", "B two", "C three", "D four"]);
        let decomposer = Decomposer::new(oracle.handle());
        let mut tree = TaskTree::new();
        let id = tree.create("Goal", TaskKind::Root, 0, None).unwrap().id();

        let subtasks = decomposer.decompose(tree.get(id).unwrap(), None, 3).await;
        assert_eq!(subtasks, vec!["A one", "B two", "C three"]);
    }

    #[tokio::test]
    async fn test_single_subtask_skips_oracle() {
        let oracle = ScriptedOracle::new();
        let decomposer = Decomposer::new(oracle.handle());
        let mut tree = TaskTree::new();
        let id = tree.create("Goal", TaskKind::Root, 0, None).unwrap().id();

        assert!(decomposer.decompose(tree.get(id).unwrap(), None, 1).await.is_empty());
        assert_eq!(oracle.calls_to(DECOMPOSITION_SYSTEM), 0);
    }

    #[tokio::test]
    async fn test_empty_answer_yields_nothing() {
        let oracle = ScriptedOracle::new().empty_decomposition("Goal");
        let decomposer = Decomposer::new(oracle.handle());
        let mut tree = TaskTree::new();
        let id = tree.create("Goal", TaskKind::Root, 0, None).unwrap().id();

        assert!(decomposer.decompose(tree.get(id).unwrap(), None, 3).await.is_empty());
    }
}
