//! Node planning - decides, per task, between decomposition and atomic
//! execution by running the cut heuristics in their fixed order.
//!
//! ```text
//! 1. Leaf kind          -> atomic
//! 2. Depth guard        -> atomic, no oracle call
//! 3. Safety ceiling     -> atomic, no oracle call
//! 4. Complexity gate    -> atomic if "do not split" (or 0 subtasks)
//! 5. Branching cap      -> proposal clamped to max_subtasks
//! 6. Decomposition      -> atomic if no subtasks
//! 7. Duplicate merge    -> atomic if nothing unique survives
//! 8. Loop detector      -> atomic if the task repeats an ancestor
//! 9. Decompose into the surviving subtasks
//! ```

use crate::agents::leaf::{ComplexityAnalyzer, Decomposer, DuplicateMerger, LoopDetector};
use crate::config::OrchestratorConfig;
use crate::oracle::OracleRef;
use crate::task::{CutReason, TaskError, TaskId, TaskKind, TaskTree};

/// What to do with a task.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Atomic(CutReason),
    /// Child descriptions, in order; never empty
    Decompose(Vec<String>),
}

/// Runs the cut heuristics for one task.
pub struct NodePlanner {
    config: OrchestratorConfig,
    complexity: ComplexityAnalyzer,
    decomposer: Decomposer,
    merger: DuplicateMerger,
    loop_detector: LoopDetector,
}

impl NodePlanner {
    pub fn new(oracle: OracleRef, config: OrchestratorConfig) -> Self {
        Self {
            complexity: ComplexityAnalyzer::new(oracle.clone()),
            decomposer: Decomposer::new(oracle.clone()),
            merger: DuplicateMerger::new(oracle.clone()),
            loop_detector: LoopDetector::new(oracle, config.similarity_threshold),
            config,
        }
    }

    /// Decide how to process `id`.
    ///
    /// # Postconditions
    /// - `Plan::Decompose(d)` implies `1 <= d.len() <= max_subtasks`
    /// - `level > max_heuristic_depth` or `level >= max_recursion_depth`
    ///   returns `Atomic` without consulting the oracle
    pub async fn plan(&self, tree: &TaskTree, id: TaskId) -> Result<Plan, TaskError> {
        let task = tree.get(id)?;
        let level = task.level();

        if task.kind() == TaskKind::Leaf {
            return Ok(Plan::Atomic(CutReason::LeafKind));
        }

        if level > self.config.max_heuristic_depth {
            tracing::warn!(
                task = %id,
                level,
                "Depth guard: level {} > {}, forcing direct execution",
                level,
                self.config.max_heuristic_depth
            );
            return Ok(Plan::Atomic(CutReason::DepthGuard {
                level,
                max: self.config.max_heuristic_depth,
            }));
        }

        if level >= self.config.max_recursion_depth {
            tracing::warn!(
                task = %id,
                level,
                "Safety ceiling ({}) reached, forcing direct execution",
                self.config.max_recursion_depth
            );
            return Ok(Plan::Atomic(CutReason::SafetyCeiling {
                level,
                ceiling: self.config.max_recursion_depth,
            }));
        }

        let analysis = self.complexity.assess(task).await;
        if !analysis.should_split || analysis.subtasks == 0 {
            return Ok(Plan::Atomic(CutReason::SimpleEnough));
        }

        let count = analysis.subtasks.min(self.config.max_subtasks);
        if count < analysis.subtasks {
            tracing::info!(
                task = %id,
                proposed = analysis.subtasks,
                capped = count,
                "Branching factor capped"
            );
        }

        let parent = task.parent().map(|p| tree.get(p)).transpose()?;
        let candidates = self.decomposer.decompose(task, parent, count).await;
        if candidates.is_empty() {
            tracing::info!(task = %id, "No subtasks produced, executing directly");
            return Ok(Plan::Atomic(CutReason::EmptyDecomposition));
        }

        let unique = self.merger.merge(task, candidates).await;
        if unique.is_empty() {
            tracing::info!(task = %id, "No unique subtasks left, executing directly");
            return Ok(Plan::Atomic(CutReason::NoUniqueSubtasks));
        }

        let ancestors = tree.ancestors_of(id)?;
        if let Some(found) = self.loop_detector.detect(task, &ancestors).await {
            return Ok(Plan::Atomic(CutReason::SemanticLoop {
                ancestor: found.ancestor,
                similarity: found.similarity,
            }));
        }

        Ok(Plan::Decompose(unique))
    }
}
