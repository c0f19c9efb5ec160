//! Verification records attached to tasks.
//!
//! A task's verification is a judgement on its `result`:
//! - the value-added pre-filter can reject it without asking the oracle
//! - otherwise the oracle verdict is recorded as-is

use serde::{Deserialize, Serialize};

/// Lowest score on the verification scale.
pub const MIN_SCORE: f64 = 0.0;

/// Highest score on the verification scale.
pub const MAX_SCORE: f64 = 10.0;

/// Score used when the verifier's answer could not be read.
pub const DEFAULT_SCORE: f64 = 5.0;

/// Judgement record for a task result.
///
/// # Invariants
/// - `score` is within `[MIN_SCORE, MAX_SCORE]` (clamped by constructors)
/// - `feedback` explains the verdict when `passed == false`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub passed: bool,
    pub score: f64,
    pub feedback: String,
    pub issues: Vec<String>,
}

impl Verification {
    /// Create a verification record with a clamped score.
    pub fn new(passed: bool, score: f64, feedback: impl Into<String>, issues: Vec<String>) -> Self {
        let score = if score.is_finite() {
            score.clamp(MIN_SCORE, MAX_SCORE)
        } else {
            DEFAULT_SCORE
        };
        Self {
            passed,
            score,
            feedback: feedback.into(),
            issues,
        }
    }

    /// A failing record with score 0.
    pub fn rejected(feedback: impl Into<String>, issues: Vec<String>) -> Self {
        Self::new(false, MIN_SCORE, feedback, issues)
    }

    /// The record used when no verdict could be obtained.
    pub fn inconclusive(feedback: impl Into<String>) -> Self {
        Self::new(false, DEFAULT_SCORE, feedback, Vec::new())
    }
}

/// Outcome of the value-added pre-filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueAssessment {
    pub has_value: bool,
    pub reason: String,
    pub instruction_hits: usize,
    pub substantive_hits: usize,
}

impl ValueAssessment {
    pub fn accepted(instruction_hits: usize, substantive_hits: usize) -> Self {
        Self {
            has_value: true,
            reason: String::new(),
            instruction_hits,
            substantive_hits,
        }
    }

    pub fn rejected(reason: impl Into<String>, instruction_hits: usize, substantive_hits: usize) -> Self {
        Self {
            has_value: false,
            reason: reason.into(),
            instruction_hits,
            substantive_hits,
        }
    }
}
