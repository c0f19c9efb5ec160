//! Scripted oracle double for unit and scenario tests.
//!
//! Calls are routed by system prompt and, optionally, by the subject task
//! (the description on the second line of every user prompt). Unscripted
//! calls get a well-behaved default answer:
//!
//! | Call          | Default                                   |
//! |---------------|-------------------------------------------|
//! | complexity    | do not split                              |
//! | decomposition | `<subject>: part k` for the requested N   |
//! | deduplication | candidates echoed back unchanged          |
//! | loop check    | similarity 10, no loop                    |
//! | execution     | a substantive result mentioning the task  |
//! | verification  | PASS, score 8.0                           |

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::agents::prompts::{
    COMPLEXITY_SYSTEM, DECOMPOSITION_SYSTEM, DEDUPLICATION_SYSTEM, EXECUTION_SYSTEM, LOOP_SYSTEM,
    VERIFICATION_SYSTEM,
};
use crate::oracle::{Oracle, OracleError, OracleRef};

/// A result the value-added filter accepts.
pub const SUBSTANTIVE_RESULT: &str = "Analysis: based on the data, the segment grew 12% in 2023 \
    and the results table shows a clear recommendation for entry.";

/// Description of the subject task in a user prompt.
pub fn subject(user_prompt: &str) -> &str {
    user_prompt.lines().nth(1).unwrap_or_default()
}

/// Description of the ancestor in a loop-check prompt.
pub fn ancestor(user_prompt: &str) -> Option<&str> {
    let mut lines = user_prompt.lines();
    lines.find(|l| l.starts_with("Ancestor task"))?;
    lines.next()
}

fn requested_count(user_prompt: &str) -> usize {
    user_prompt
        .split("EXACTLY ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

fn echo_candidates(user_prompt: &str) -> String {
    user_prompt
        .lines()
        .skip_while(|l| !l.starts_with("Candidate subtasks:"))
        .skip(1)
        .take_while(|l| !l.trim().is_empty())
        .map(|l| crate::util::strip_list_marker(l).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Unavailable,
}

#[derive(Debug, Clone)]
struct Rule {
    system: &'static str,
    subject: Option<String>,
    ancestor: Option<String>,
    reply: Reply,
}

impl Rule {
    fn matches(&self, system: &str, user: &str) -> bool {
        self.system == system
            && self.subject.as_deref().map_or(true, |s| s == subject(user))
            && self.ancestor.as_deref().map_or(true, |a| Some(a) == ancestor(user))
    }
}

#[derive(Default)]
struct Inner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<(String, String)>>,
}

/// Oracle double; clones share rules and the call log.
#[derive(Clone, Default)]
pub struct ScriptedOracle {
    inner: Arc<Inner>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> OracleRef {
        Arc::new(self.clone())
    }

    fn push(self, rule: Rule) -> Self {
        self.inner.rules.lock().unwrap().push(rule);
        self
    }

    /// Answer `system` calls (optionally only for `subject`) with `text`.
    pub fn reply(self, system: &'static str, subject: Option<&str>, text: &str) -> Self {
        self.push(Rule {
            system,
            subject: subject.map(str::to_string),
            ancestor: None,
            reply: Reply::Text(text.to_string()),
        })
    }

    /// Fail every `system` call.
    pub fn unavailable(self, system: &'static str) -> Self {
        self.push(Rule {
            system,
            subject: None,
            ancestor: None,
            reply: Reply::Unavailable,
        })
    }

    /// Complexity gate says "split into `count`" for `subject`.
    pub fn split(self, subject: &str, count: usize) -> Self {
        let text = format!(
            "OUTPUT_SIZE: LONG\nSPLIT: YES\nSUBTASKS: {}\nCOMPLEXITY: HIGH\nREASONING: scripted",
            count
        );
        self.reply(COMPLEXITY_SYSTEM, Some(subject), &text)
    }

    /// Complexity gate says "split into `count`" for every task.
    pub fn always_split(self, count: usize) -> Self {
        let text = format!(
            "OUTPUT_SIZE: VERY_LONG\nSPLIT: YES\nSUBTASKS: {}\nCOMPLEXITY: VERY_HIGH",
            count
        );
        self.reply(COMPLEXITY_SYSTEM, None, &text)
    }

    /// Decomposition of `subject` returns `items` as a numbered list.
    pub fn subtasks(self, subject: &str, items: &[&str]) -> Self {
        let text = items
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n");
        self.reply(DECOMPOSITION_SYSTEM, Some(subject), &text)
    }

    /// Decomposition of `subject` returns an empty string.
    pub fn empty_decomposition(self, subject: &str) -> Self {
        self.reply(DECOMPOSITION_SYSTEM, Some(subject), "")
    }

    /// Duplicate merge for `subject` returns `items`, one per line.
    pub fn merged(self, subject: &str, items: &[&str]) -> Self {
        self.reply(DEDUPLICATION_SYSTEM, Some(subject), &items.join("\n"))
    }

    /// Loop check of `subject` against `ancestor` reports a loop.
    pub fn loop_against(self, subject: &str, ancestor: &str) -> Self {
        self.push(Rule {
            system: LOOP_SYSTEM,
            subject: Some(subject.to_string()),
            ancestor: Some(ancestor.to_string()),
            reply: Reply::Text(
                "IDENTICAL: YES\nSIMILARITY: 95\nLOOP: YES\nREASONING: same goal".to_string(),
            ),
        })
    }

    /// Execution of `subject` returns `text`.
    pub fn result(self, subject: &str, text: &str) -> Self {
        self.reply(EXECUTION_SYSTEM, Some(subject), text)
    }

    /// Verification of `subject` passes or fails.
    pub fn verdict(self, subject: &str, passed: bool) -> Self {
        let text = if passed {
            "VERDICT: PASS\nSCORE: 9\nFEEDBACK: Good\nISSUES: none"
        } else {
            "VERDICT: FAIL\nSCORE: 2.5\nFEEDBACK: Missing figures\nISSUES: no numbers; no sources"
        };
        self.reply(VERIFICATION_SYSTEM, Some(subject), text)
    }

    /// Every recorded `(system, user)` pair in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, system: &str) -> usize {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == system)
            .count()
    }

    /// Subjects of every `system` call, in call order.
    pub fn subjects_for(&self, system: &str) -> Vec<String> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == system)
            .map(|(_, u)| subject(u).to_string())
            .collect()
    }

    fn default_reply(system: &str, user: &str) -> Result<String, OracleError> {
        let subject = subject(user);
        let text = if system == COMPLEXITY_SYSTEM {
            "OUTPUT_SIZE: SHORT\nSPLIT: NO\nSUBTASKS: 0\nCOMPLEXITY: LOW\nREASONING: simple".to_string()
        } else if system == DECOMPOSITION_SYSTEM {
            (1..=requested_count(user))
                .map(|k| format!("{}. {}: part {}", k, subject, k))
                .collect::<Vec<_>>()
                .join("\n")
        } else if system == DEDUPLICATION_SYSTEM {
            echo_candidates(user)
        } else if system == LOOP_SYSTEM {
            "IDENTICAL: NO\nSIMILARITY: 10\nLOOP: NO\nREASONING: different".to_string()
        } else if system == EXECUTION_SYSTEM {
            format!("Result for '{}'. {}", subject, SUBSTANTIVE_RESULT)
        } else if system == VERIFICATION_SYSTEM {
            "VERDICT: PASS\nSCORE: 8.0\nFEEDBACK: Solid\nISSUES: none".to_string()
        } else {
            return Err(OracleError::Unavailable("unscripted system prompt".to_string()));
        };
        Ok(text)
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn ask(&self, system_prompt: &str, user_prompt: &str) -> Result<String, OracleError> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        let rule = self
            .inner
            .rules
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.matches(system_prompt, user_prompt))
            .cloned();

        match rule.map(|r| r.reply) {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Unavailable) => Err(OracleError::Unavailable("scripted outage".to_string())),
            None => Self::default_reply(system_prompt, user_prompt),
        }
    }
}
