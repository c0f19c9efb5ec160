//! Verification agent - validates task results.
//!
//! # Verification Strategy
//! 1. No result: fail with score 0, no oracle call
//! 2. Value-added filter rejects: fail with score 0, no oracle call
//! 3. Otherwise ask the oracle and record its verdict
//!
//! An unavailable oracle or an unreadable answer yields the inconclusive
//! default (score 5.0, not passed).

use crate::agents::prompts::{verification_prompt, VERIFICATION_SYSTEM};
use crate::oracle::{parse_verification, OracleRef};
use crate::task::{Task, Verification};

use super::value_filter::ValueAddedFilter;

pub struct Verifier {
    oracle: OracleRef,
    filter: ValueAddedFilter,
}

impl Verifier {
    pub fn new(oracle: OracleRef) -> Self {
        Self {
            oracle,
            filter: ValueAddedFilter::new(),
        }
    }

    /// Judge a task's result.
    pub async fn verify(&self, task: &Task) -> Verification {
        let Some(result) = task.result() else {
            return Verification::rejected(
                "No result to verify",
                vec!["Task was not executed".to_string()],
            );
        };

        let assessment = self.filter.assess(result);
        if !assessment.has_value {
            tracing::warn!(
                task = %task.id(),
                instruction_hits = assessment.instruction_hits,
                substantive_hits = assessment.substantive_hits,
                "Result adds no value"
            );
            return Verification::rejected(
                format!("Result adds no value. {}", assessment.reason),
                vec!["Result contains only instructions, no actual data, analysis or code".to_string()],
            );
        }

        let verification = match self
            .oracle
            .ask(VERIFICATION_SYSTEM, &verification_prompt(task, result))
            .await
        {
            Ok(answer) => Verification::from(parse_verification(&answer)),
            Err(e) => {
                tracing::warn!(task = %task.id(), "Verifier unavailable: {}", e);
                Verification::inconclusive(format!("Verifier unavailable: {}", e))
            }
        };

        if verification.passed {
            tracing::info!(task = %task.id(), score = verification.score, "Verification passed");
        } else {
            tracing::warn!(
                task = %task.id(),
                score = verification.score,
                "Verification failed: {}",
                verification.feedback
            );
        }
        verification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskId, TaskKind, TaskTree, DEFAULT_SCORE};
    use crate::test_support::{ScriptedOracle, SUBSTANTIVE_RESULT};

    fn with_result(result: Option<&str>) -> (TaskTree, TaskId) {
        let mut tree = TaskTree::new();
        let id = tree.create("Size the market", TaskKind::Root, 0, None).unwrap().id();
        if let Some(result) = result {
            tree.set_result(id, result).unwrap();
        }
        (tree, id)
    }

    #[tokio::test]
    async fn test_missing_result_fails_without_oracle() {
        let oracle = ScriptedOracle::new();
        let verifier = Verifier::new(oracle.handle());
        let (tree, id) = with_result(None);

        let v = verifier.verify(tree.get(id).unwrap()).await;
        assert!(!v.passed);
        assert_eq!(v.score, 0.0);
        assert_eq!(oracle.calls_to(VERIFICATION_SYSTEM), 0);
    }

    #[tokio::test]
    async fn test_value_filter_short_circuits() {
        let oracle = ScriptedOracle::new();
        let verifier = Verifier::new(oracle.handle());
        let (tree, id) = with_result(Some("Search online."));

        let v = verifier.verify(tree.get(id).unwrap()).await;
        assert!(!v.passed);
        assert_eq!(v.score, 0.0);
        assert!(v.feedback.starts_with("Result adds no value"));
        assert_eq!(oracle.calls_to(VERIFICATION_SYSTEM), 0);
    }

    #[tokio::test]
    async fn test_oracle_verdict_is_recorded() {
        let oracle = ScriptedOracle::new().verdict("Size the market", false);
        let verifier = Verifier::new(oracle.handle());
        let (tree, id) = with_result(Some(SUBSTANTIVE_RESULT));

        let v = verifier.verify(tree.get(id).unwrap()).await;
        assert!(!v.passed);
        assert_eq!(oracle.calls_to(VERIFICATION_SYSTEM), 1);
    }

    #[tokio::test]
    async fn test_unreadable_verdict_defaults() {
        let oracle = ScriptedOracle::new().reply(VERIFICATION_SYSTEM, None, "Looks okay I guess");
        let verifier = Verifier::new(oracle.handle());
        let (tree, id) = with_result(Some(SUBSTANTIVE_RESULT));

        let v = verifier.verify(tree.get(id).unwrap()).await;
        assert!(!v.passed);
        assert_eq!(v.score, DEFAULT_SCORE);
    }

    #[tokio::test]
    async fn test_outage_defaults() {
        let oracle = ScriptedOracle::new().unavailable(VERIFICATION_SYSTEM);
        let verifier = Verifier::new(oracle.handle());
        let (tree, id) = with_result(Some(SUBSTANTIVE_RESULT));

        let v = verifier.verify(tree.get(id).unwrap()).await;
        assert!(!v.passed);
        assert_eq!(v.score, DEFAULT_SCORE);
        assert!(v.feedback.contains("unavailable"));
    }
}
