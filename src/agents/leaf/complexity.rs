//! Complexity gate.
//!
//! Asks the oracle whether a task should be split and into how many
//! subtasks, together with an output-size estimate and a complexity grade.

use crate::agents::prompts::{complexity_prompt, COMPLEXITY_SYSTEM};
use crate::oracle::{parse_complexity, OracleRef, ParsedComplexity};
use crate::task::Task;

/// Agent that decides whether a task needs decomposition.
///
/// # Algorithm
/// 1. Send the task description and level to the oracle
/// 2. Parse the `KEY: value` answer
/// 3. Fall back to "do not split" on outage or unreadable answers
pub struct ComplexityAnalyzer {
    oracle: OracleRef,
}

impl ComplexityAnalyzer {
    pub fn new(oracle: OracleRef) -> Self {
        Self { oracle }
    }

    /// Assess a task.
    ///
    /// # Postconditions
    /// - `should_split == true` implies `subtasks >= 1`
    pub async fn assess(&self, task: &Task) -> ParsedComplexity {
        let answer = match self
            .oracle
            .ask(COMPLEXITY_SYSTEM, &complexity_prompt(task))
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(task = %task.id(), "Complexity gate unavailable, not splitting: {}", e);
                return ParsedComplexity::do_not_split(format!("Oracle unavailable: {}", e));
            }
        };

        let analysis = parse_complexity(&answer);
        if !analysis.recognized {
            tracing::warn!(task = %task.id(), "Unreadable complexity answer, not splitting");
        }

        if analysis.should_split {
            tracing::info!(
                task = %task.id(),
                level = task.level(),
                subtasks = analysis.subtasks,
                output = ?analysis.output_size,
                complexity = ?analysis.grade,
                "Task needs splitting"
            );
        } else {
            tracing::info!(
                task = %task.id(),
                level = task.level(),
                output = ?analysis.output_size,
                complexity = ?analysis.grade,
                "Task simple enough to execute directly"
            );
        }

        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OutputSize;
    use crate::task::{TaskKind, TaskTree};
    use crate::test_support::ScriptedOracle;

    fn task_tree(description: &str) -> (TaskTree, crate::task::TaskId) {
        let mut tree = TaskTree::new();
        let id = tree.create(description, TaskKind::Root, 0, None).unwrap().id();
        (tree, id)
    }

    #[tokio::test]
    async fn test_split_verdict() {
        let oracle = ScriptedOracle::new().split("Big goal", 4);
        let analyzer = ComplexityAnalyzer::new(oracle.handle());
        let (tree, id) = task_tree("Big goal");

        let analysis = analyzer.assess(tree.get(id).unwrap()).await;
        assert!(analysis.should_split);
        assert_eq!(analysis.subtasks, 4);
        assert_eq!(analysis.output_size, OutputSize::Long);
    }

    #[tokio::test]
    async fn test_outage_means_no_split() {
        let oracle = ScriptedOracle::new().unavailable(COMPLEXITY_SYSTEM);
        let analyzer = ComplexityAnalyzer::new(oracle.handle());
        let (tree, id) = task_tree("Big goal");

        let analysis = analyzer.assess(tree.get(id).unwrap()).await;
        assert!(!analysis.should_split);
        assert!(analysis.reasoning.contains("unavailable"));
    }
}
