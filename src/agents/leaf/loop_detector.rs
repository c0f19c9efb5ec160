//! Semantic loop detector.
//!
//! Guards against "bureaucratic" recursion where a task deep in the tree
//! keeps re-deriving one of its ancestors' goals.

use crate::agents::prompts::{loop_prompt, LOOP_SYSTEM};
use crate::oracle::{parse_similarity, OracleRef};
use crate::task::{Task, TaskId};

/// An ancestor the task repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopMatch {
    pub ancestor: TaskId,
    pub ancestor_level: u32,
    pub similarity: u8,
    pub reasoning: String,
}

pub struct LoopDetector {
    oracle: OracleRef,
    threshold: u8,
}

impl LoopDetector {
    pub fn new(oracle: OracleRef, threshold: u8) -> Self {
        Self { oracle, threshold }
    }

    /// Compare `task` with each ancestor, nearest first.
    ///
    /// Returns the first ancestor judged identical, an explicit loop, or
    /// more similar than the threshold. An unavailable oracle counts as
    /// "no loop" for that ancestor.
    pub async fn detect(&self, task: &Task, ancestors: &[&Task]) -> Option<LoopMatch> {
        if ancestors.is_empty() {
            return None;
        }
        tracing::debug!(task = %task.id(), "Checking against {} ancestors", ancestors.len());

        for ancestor in ancestors {
            let answer = match self.oracle.ask(LOOP_SYSTEM, &loop_prompt(task, ancestor)).await {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::warn!(
                        task = %task.id(),
                        ancestor = %ancestor.id(),
                        "Loop check unavailable, assuming no loop: {}",
                        e
                    );
                    continue;
                }
            };

            let verdict = parse_similarity(&answer);
            if verdict.is_repeat(self.threshold) {
                tracing::warn!(
                    task = %task.id(),
                    ancestor = %ancestor.id(),
                    similarity = verdict.similarity,
                    "Semantic loop: level {} repeats level {}",
                    task.level(),
                    ancestor.level()
                );
                return Some(LoopMatch {
                    ancestor: ancestor.id(),
                    ancestor_level: ancestor.level(),
                    similarity: verdict.similarity,
                    reasoning: verdict.reasoning,
                });
            }
        }

        tracing::debug!(task = %task.id(), "No semantic loop");
        None
    }
}
