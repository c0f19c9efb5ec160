//! Duplicate merger: collapses overlapping subtask candidates.

use crate::agents::prompts::{deduplication_prompt, DEDUPLICATION_SYSTEM};
use crate::oracle::{parse_unique_subtasks, OracleRef};
use crate::task::Task;

pub struct DuplicateMerger {
    oracle: OracleRef,
}

impl DuplicateMerger {
    pub fn new(oracle: OracleRef) -> Self {
        Self { oracle }
    }

    /// Reduce `candidates` to a unique set.
    ///
    /// # Postconditions
    /// - `result.len() <= candidates.len()`
    /// - zero or one candidate is returned unchanged without an oracle call
    /// - outage or an unusable answer yields an empty list
    pub async fn merge(&self, task: &Task, candidates: Vec<String>) -> Vec<String> {
        if candidates.len() <= 1 {
            return candidates;
        }

        let prompt = deduplication_prompt(task, &candidates);
        let answer = match self.oracle.ask(DEDUPLICATION_SYSTEM, &prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(task = %task.id(), "Duplicate merge unavailable: {}", e);
                return Vec::new();
            }
        };

        let unique = parse_unique_subtasks(&answer, candidates.len());
        let eliminated = candidates.len() - unique.len();
        if eliminated > 0 {
            tracing::info!(
                task = %task.id(),
                eliminated,
                remaining = unique.len(),
                "Eliminated overlapping subtasks"
            );
        } else {
            tracing::debug!(task = %task.id(), "All {} subtasks are unique", unique.len());
        }
        unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskKind, TaskTree};
    use crate::test_support::ScriptedOracle;

    #[tokio::test]
    async fn test_merge_drops_duplicates() {
        let oracle = ScriptedOracle::new().merged("Goal", &["Research the market size", "Map the competitors"]);
        let merger = DuplicateMerger::new(oracle.handle());
        let mut tree = TaskTree::new();
        let id = tree.create("Goal", TaskKind::Root, 0, None).unwrap().id();

        let candidates = vec![
            "Research the market size".to_string(),
            "Estimate the market size".to_string(),
            "Map the competitors".to_string(),
        ];
        let unique = merger.merge(tree.get(id).unwrap(), candidates).await;
        assert_eq!(unique, vec!["Research the market size", "Map the competitors"]);
    }

    #[tokio::test]
    async fn test_single_candidate_skips_oracle() {
        let oracle = ScriptedOracle::new();
        let merger = DuplicateMerger::new(oracle.handle());
        let mut tree = TaskTree::new();
        let id = tree.create("Goal", TaskKind::Root, 0, None).unwrap().id();

        let unique = merger
            .merge(tree.get(id).unwrap(), vec!["Only one subtask".to_string()])
            .await;
        assert_eq!(unique.len(), 1);
        assert_eq!(oracle.calls_to(DEDUPLICATION_SYSTEM), 0);
    }

    #[tokio::test]
    async fn test_merge_never_grows_the_list() {
        let oracle = ScriptedOracle::new().merged(
            "Goal",
            &["First long subtask", "Second long subtask", "Third long subtask"],
        );
        let merger = DuplicateMerger::new(oracle.handle());
        let mut tree = TaskTree::new();
        let id = tree.create("Goal", TaskKind::Root, 0, None).unwrap().id();

        let unique = merger
            .merge(
                tree.get(id).unwrap(),
                vec!["First long subtask".to_string(), "Second long subtask".to_string()],
            )
            .await;
        assert_eq!(unique.len(), 2);
    }

    #[tokio::test]
    async fn test_outage_yields_empty() {
        let oracle = ScriptedOracle::new().unavailable(DEDUPLICATION_SYSTEM);
        let merger = DuplicateMerger::new(oracle.handle());
        let mut tree = TaskTree::new();
        let id = tree.create("Goal", TaskKind::Root, 0, None).unwrap().id();

        let unique = merger
            .merge(
                tree.get(id).unwrap(),
                vec!["First long subtask".to_string(), "Second long subtask".to_string()],
            )
            .await;
        assert!(unique.is_empty());
    }
}
