//! Best-effort parsers for oracle answers.
//!
//! Oracle answers are line-oriented `KEY: value` text. Parsers never fail:
//! anything they cannot read falls back to a documented default.
//!
//! | Answer       | Default on garbage                     |
//! |--------------|----------------------------------------|
//! | complexity   | do not split                           |
//! | verification | `passed = false`, score 5.0            |
//! | similarity   | not a loop, similarity 0               |
//! | subtask list | empty list                             |

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::task::{Verification, DEFAULT_SCORE};
use crate::util::strip_list_marker;

/// Subtask count assumed when the oracle says "split" without a count.
pub const DEFAULT_SPLIT_COUNT: usize = 3;

/// Shortest merged subtask line kept by [`parse_unique_subtasks`].
const MIN_SUBTASK_CHARS: usize = 11;

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid integer regex"))
}

fn decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("valid decimal regex"))
}

/// Split a `KEY: value` line into a normalised key and its value.
///
/// Keys are upper-cased with spaces turned into `_`; markdown emphasis and
/// list markers around the key are ignored. Values lose emphasis and one or
/// more enclosing bracket or quote pairs, so `[YES]` reads as `YES`.
fn field(line: &str) -> Option<(String, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key
        .trim()
        .trim_matches(|c: char| matches!(c, '*' | '#' | '-' | '_' | ' '))
        .to_uppercase()
        .replace(' ', "_");
    if key.is_empty() {
        return None;
    }
    Some((key, unwrap_value(value)))
}

fn unwrap_value(value: &str) -> &str {
    let mut value = value.trim().trim_matches('*').trim();
    loop {
        let inner = [('[', ']'), ('(', ')'), ('"', '"'), ('\'', '\''), ('`', '`')]
            .iter()
            .find_map(move |(open, close)| {
                value
                    .strip_prefix(*open)
                    .and_then(|rest| rest.strip_suffix(*close))
            });
        match inner {
            Some(inner) => value = inner.trim().trim_matches('*').trim(),
            None => return value,
        }
    }
}

fn first_integer(text: &str) -> Option<u64> {
    integer_re().find(text).and_then(|m| m.as_str().parse().ok())
}

fn is_yes(value: &str) -> bool {
    let upper = value.trim().to_uppercase();
    upper.starts_with("YES") || upper.starts_with("TRUE")
}

/// Expected amount of output a task will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSize {
    Short,
    #[default]
    Medium,
    Long,
    VeryLong,
}

/// Complexity grade reported alongside the split verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityGrade {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

/// Complexity gate verdict.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedComplexity {
    pub should_split: bool,
    /// Proposed subtask count, before the branching cap
    pub subtasks: usize,
    pub output_size: OutputSize,
    pub grade: ComplexityGrade,
    pub reasoning: String,
    /// Whether any known field was found in the answer
    pub recognized: bool,
}

impl ParsedComplexity {
    /// The fallback verdict: execute directly.
    pub fn do_not_split(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            ..Self::default()
        }
    }
}

/// Parse a complexity answer.
///
/// # Postconditions
/// - `should_split == false` unless a `SPLIT: YES` line was found
/// - an explicit count of 0 turns the verdict into "do not split"
/// - `SPLIT: YES` without a count line proposes [`DEFAULT_SPLIT_COUNT`]
pub fn parse_complexity(answer: &str) -> ParsedComplexity {
    let mut parsed = ParsedComplexity::default();
    let mut count: Option<usize> = None;

    for line in answer.lines() {
        let Some((key, value)) = field(line) else {
            continue;
        };
        let upper = value.to_uppercase().replace(' ', "_");
        match key.as_str() {
            "OUTPUT_SIZE" | "POTENTIAL_OUTPUT" => {
                parsed.recognized = true;
                parsed.output_size = if upper.contains("VERY_LONG") {
                    OutputSize::VeryLong
                } else if upper.contains("LONG") {
                    OutputSize::Long
                } else if upper.contains("SHORT") {
                    OutputSize::Short
                } else {
                    OutputSize::Medium
                };
            }
            "SPLIT" | "DECOMPOSE" => {
                parsed.recognized = true;
                parsed.should_split = is_yes(value);
            }
            "SUBTASKS" | "SUBTASK_COUNT" | "NUM_SUBTASKS" => {
                parsed.recognized = true;
                count = first_integer(value).map(|n| n.min(usize::MAX as u64) as usize);
            }
            "COMPLEXITY" => {
                parsed.recognized = true;
                parsed.grade = if upper.contains("VERY_HIGH") {
                    ComplexityGrade::VeryHigh
                } else if upper.contains("HIGH") {
                    ComplexityGrade::High
                } else if upper.contains("LOW") {
                    ComplexityGrade::Low
                } else {
                    ComplexityGrade::Medium
                };
            }
            "REASONING" | "JUSTIFICATION" => {
                parsed.reasoning = value.to_string();
            }
            _ => {}
        }
    }

    match (parsed.should_split, count) {
        (true, Some(0)) => {
            parsed.should_split = false;
            parsed.subtasks = 0;
        }
        (true, Some(n)) => parsed.subtasks = n,
        (true, None) => parsed.subtasks = DEFAULT_SPLIT_COUNT,
        (false, _) => parsed.subtasks = 0,
    }

    parsed
}

/// Verifier verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedVerification {
    pub passed: bool,
    pub score: f64,
    pub feedback: String,
    pub issues: Vec<String>,
    pub recognized: bool,
}

impl From<ParsedVerification> for Verification {
    fn from(parsed: ParsedVerification) -> Self {
        Verification::new(parsed.passed, parsed.score, parsed.feedback, parsed.issues)
    }
}

/// Parse a verification answer.
///
/// # Postconditions
/// - `passed == false` unless a `VERDICT: PASS` line was found
/// - `score == DEFAULT_SCORE` when no readable score was found
pub fn parse_verification(answer: &str) -> ParsedVerification {
    let mut parsed = ParsedVerification {
        passed: false,
        score: DEFAULT_SCORE,
        feedback: String::new(),
        issues: Vec::new(),
        recognized: false,
    };

    for line in answer.lines() {
        let Some((key, value)) = field(line) else {
            continue;
        };
        match key.as_str() {
            "VERDICT" | "RESULT" => {
                parsed.recognized = true;
                parsed.passed = value.to_uppercase().starts_with("PASS");
            }
            "SCORE" => {
                let head = value.split('/').next().unwrap_or_default();
                if let Some(score) = decimal_re()
                    .find(head)
                    .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
                {
                    parsed.score = score;
                }
            }
            "FEEDBACK" => parsed.feedback = value.to_string(),
            "ISSUES" | "PROBLEMS" => {
                let lower = value.to_lowercase();
                if !value.is_empty() && !matches!(lower.as_str(), "none" | "n/a" | "-" | "no issues")
                {
                    parsed.issues = value
                        .split(';')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect();
                }
            }
            _ => {}
        }
    }

    if !parsed.recognized && parsed.feedback.is_empty() {
        parsed.feedback = "Verifier answer could not be read".to_string();
    }
    parsed
}

/// Loop detector verdict for one ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedSimilarity {
    pub identical: bool,
    /// 0-100
    pub similarity: u8,
    pub is_loop: bool,
    pub reasoning: String,
}

impl ParsedSimilarity {
    /// Whether this verdict means the child repeats the ancestor.
    pub fn is_repeat(&self, threshold: u8) -> bool {
        self.is_loop || self.identical || self.similarity > threshold
    }
}

/// Parse a similarity answer.
pub fn parse_similarity(answer: &str) -> ParsedSimilarity {
    let mut parsed = ParsedSimilarity::default();

    for line in answer.lines() {
        let Some((key, value)) = field(line) else {
            continue;
        };
        match key.as_str() {
            "IDENTICAL" => parsed.identical = is_yes(value),
            "SIMILARITY" | "SIMILARITY_DEGREE" => {
                if let Some(n) = first_integer(value) {
                    parsed.similarity = n.min(100) as u8;
                }
            }
            "LOOP" => parsed.is_loop = is_yes(value),
            "REASONING" => parsed.reasoning = value.to_string(),
            _ => {}
        }
    }

    parsed
}

/// Parse a decomposition answer into at most `max` subtask descriptions.
///
/// Only list lines count: those starting with a digit, `-` or `•`.
pub fn parse_subtask_list(answer: &str, max: usize) -> Vec<String> {
    answer
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with(|c: char| c.is_ascii_digit()) || line.starts_with(['-', '•'])
        })
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .take(max)
        .collect()
}

/// Parse a duplicate-merge answer into at most `max` subtask descriptions.
///
/// Any non-heading line counts; lines shorter than 11 characters are noise.
pub fn parse_unique_subtasks(answer: &str, max: usize) -> Vec<String> {
    answer
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(strip_list_marker)
        .filter(|line| line.chars().count() >= MIN_SUBTASK_CHARS)
        .map(str::to_string)
        .take(max)
        .collect()
}
