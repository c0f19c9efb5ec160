//! Value-added filter.
//!
//! A cheap, oracle-free pre-check on results: rejects text that only tells
//! the reader where to look ("search for...", "see the documentation...")
//! instead of delivering analysis, data or code.
//!
//! # Policy
//! - `instruction_hits >= 3 && substantive_hits < 2` rejects
//! - a result shorter than 50 characters rejects
//! - everything else passes to the oracle verifier

use std::sync::OnceLock;

use regex::Regex;

use crate::task::ValueAssessment;

/// Results shorter than this (in characters) carry no value.
pub const MIN_RESULT_CHARS: usize = 50;

const MIN_INSTRUCTION_HITS: usize = 3;
const MIN_SUBSTANTIVE_HITS: usize = 2;

const INSTRUCTION_PHRASES: &[&str] = &[
    "search for",
    "look up",
    "check the",
    "read the",
    "go to",
    "visit",
    "click",
    "use the api",
    "use the library",
    "contact",
    "ask ",
    "how to find",
    "where to find",
    "instructions:",
    "guide:",
    "links to",
    "references to",
    "see the documentation",
    "see documentation",
    "refer to",
    "handbook",
];

const SUBSTANTIVE_PHRASES: &[&str] = &[
    "analysis",
    "result",
    "data",
    "statistic",
    "shows",
    "indicates",
    "based on",
    "calculation",
    "recommend",
    "code",
    "import ",
    "table",
    "number:",
    "value:",
    "percent",
    "```",
    "| ",
];

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d+(?:[.,]\d+)?\s*%|\$\s?\d[\d,.]*|\b\d{2,}(?:[.,]\d+)?\b")
            .expect("valid numeric regex")
    })
}

fn count_phrases(text: &str, phrases: &[&str]) -> usize {
    phrases.iter().map(|p| text.matches(p).count()).sum()
}

/// Stateless value-added filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueAddedFilter;

impl ValueAddedFilter {
    pub fn new() -> Self {
        Self
    }

    /// Judge whether `result` carries substantive content.
    pub fn assess(&self, result: &str) -> ValueAssessment {
        let lower = result.to_lowercase();
        let instruction_hits = count_phrases(&lower, INSTRUCTION_PHRASES);
        let substantive_hits =
            count_phrases(&lower, SUBSTANTIVE_PHRASES) + numeric_re().find_iter(&lower).count();

        if instruction_hits >= MIN_INSTRUCTION_HITS && substantive_hits < MIN_SUBSTANTIVE_HITS {
            return ValueAssessment::rejected(
                "Result is mostly instructions ('search for', 'see the documentation', ...) without actual data.",
                instruction_hits,
                substantive_hits,
            );
        }

        if result.trim().chars().count() < MIN_RESULT_CHARS {
            return ValueAssessment::rejected(
                "Result is too short; it reads like an instruction, not a complete solution.",
                instruction_hits,
                substantive_hits,
            );
        }

        ValueAssessment::accepted(instruction_hits, substantive_hits)
    }
}
