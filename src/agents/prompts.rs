//! System prompts and user prompt builders for every oracle call.
//!
//! System prompts are constant per heuristic: they carry the role and the
//! answer format. Anything task-specific (level, counts, parent context) goes
//! into the user prompt, which always opens with the subject task:
//!
//! ```text
//! Task (level N):
//! <description>
//! ```

use crate::task::{Task, TaskId};

pub const COMPLEXITY_SYSTEM: &str = r#"You are an expert in task complexity analysis. You judge the POTENTIAL OUTPUT of a task.
Assess the task by:
1. How much text or data the task will produce
2. Whether it is simple enough to do in one step
3. How many distinct steps or analyses it needs

Output size:
SHORT (< 500 words): a short answer, a few sentences, a list
MEDIUM (500-1500 words): a short explanation, a few paragraphs
LONG (1500-5000 words): a report with several sections
VERY_LONG (> 5000 words): a detailed multi-aspect analysis

A SIMPLE task (no split): short or medium output, one step, concrete and unambiguous.
A COMPLEX task (split): long or very long output, several steps, several domains, too broad.

Answer in exactly this format:
OUTPUT_SIZE: [SHORT/MEDIUM/LONG/VERY_LONG]
SPLIT: [YES/NO]
SUBTASKS: [2-5 if YES, 0 if NO]
COMPLEXITY: [LOW/MEDIUM/HIGH/VERY_HIGH]
REASONING: [why, based on the potential output]"#;

pub const DECOMPOSITION_SYSTEM: &str = r#"You are an expert in task decomposition. Break a complex task into the requested number of smaller, executable subtasks.

Rules:
1. Every subtask is concrete and executable
2. Subtasks are in a logical order
3. Together the subtasks fully accomplish the task
4. Put each subtask on its own numbered line
5. Return exactly the requested number of subtasks, nothing else"#;

pub const DEDUPLICATION_SYSTEM: &str = r#"You are an expert in detecting duplicate tasks. Given a list of subtasks:
1. Find subtasks that overlap or duplicate each other
2. Keep the most complete version of each
3. Return ONLY the unique, non-overlapping subtasks

Rules:
- Two subtasks doing the same thing: keep ONE, the more complete
- Subtask A contained in subtask B: keep only B
- Complementary subtasks (different aspects): keep BOTH
- One subtask per line, without numbering
- If all subtasks are unique, return all of them"#;

pub const LOOP_SYSTEM: &str = r#"You are an expert in semantic analysis. Decide whether two tasks are semantically identical or nearly so.

Compare the tasks:
1. Do they do exactly the same thing?
2. Is one just a rewording of the other (a loop)?
3. Are they complementary or redundant?

Answer in exactly this format:
IDENTICAL: [YES/NO]
SIMILARITY: [0-100]
LOOP: [YES/NO]
REASONING: [short explanation]"#;

pub const EXECUTION_SYSTEM: &str = r#"You are a specialised execution agent. Carry out one concrete task and present a detailed result.

Rules:
1. Do the task exactly as described
2. Return a concrete, measurable result: analysis, text, code or data
3. Use the provided context when it helps
4. Be concise but complete
5. If the task cannot be done, explain why"#;

pub const VERIFICATION_SYSTEM: &str = r#"You are an expert in quality control. Judge whether a task was completed correctly and completely.

ACCEPTABLE results contain at least one of:
  - analysis (insights, conclusions, interpretation)
  - text (descriptive explanations, detailed discussion)
  - code (scripts, functions, implementation)
  - tables or data (structured data, metrics)

UNACCEPTABLE results contain ONLY:
  - "search here..." (instructions without content)
  - "read the file..." (links without analysis)
  - "use the API..." (hints without implementation)
  - "see the documentation..." (references without context)

Answer in exactly this format:
VERDICT: [PASS/FAIL]
SCORE: [0.0-10.0]
FEEDBACK: [detailed assessment]
ISSUES: [problems separated by ';', or "none"]"#;

fn subject(task: &Task) -> String {
    format!("Task (level {}):\n{}\n", task.level(), task.description())
}

pub fn complexity_prompt(task: &Task) -> String {
    format!(
        "{}\nFocus on the potential output: how much text or data will this task produce?\nDoes it need to be split into subtasks?",
        subject(task)
    )
}

pub fn decomposition_prompt(task: &Task, parent: Option<&Task>, count: usize) -> String {
    let mut prompt = subject(task);
    if let Some(parent) = parent {
        prompt.push_str(&format!("\nParent task context: {}\n", parent.description()));
    }
    prompt.push_str(&format!("\nBreak this task into EXACTLY {} subtasks.", count));
    prompt
}

pub fn deduplication_prompt(task: &Task, candidates: &[String]) -> String {
    let list = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{}\nCandidate subtasks:\n{}\n\nReturn ONLY the unique, non-overlapping subtasks (no numbering).",
        subject(task),
        list
    )
}

pub fn loop_prompt(task: &Task, ancestor: &Task) -> String {
    format!(
        "{}\nAncestor task (level {}):\n{}\n\nAre these tasks semantically identical, or does the first one loop back to the ancestor?",
        subject(task),
        ancestor.level(),
        ancestor.description()
    )
}

/// Context handed to a worker with an atomic task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    pub parent: Option<String>,
    /// Already-completed siblings and their (truncated) results
    pub siblings: Vec<(TaskId, String)>,
}

impl ExecutionContext {
    pub fn is_empty(&self) -> bool {
        self.parent.is_none() && self.siblings.is_empty()
    }
}

pub fn execution_prompt(task: &Task, context: &ExecutionContext) -> String {
    let mut prompt = subject(task);
    if !context.is_empty() {
        prompt.push_str("\nContext from related tasks:\n");
        if let Some(parent) = &context.parent {
            prompt.push_str(&format!("- parent_task: {}\n", parent));
        }
        for (id, result) in &context.siblings {
            prompt.push_str(&format!("- sibling {}: {}\n", id, result));
        }
    }
    prompt.push_str("\nExecute the task and present the result.");
    prompt
}

pub fn verification_prompt(task: &Task, result: &str) -> String {
    format!(
        "{}\nResult:\n{}\n\nJudge the quality of this result. Does it contain REAL VALUE (analysis, text, code, data)?",
        subject(task),
        result
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskKind, TaskTree};

    #[test]
    fn test_user_prompts_open_with_subject() {
        let mut tree = TaskTree::new();
        let root = tree.create("Plan a launch", TaskKind::Root, 0, None).unwrap().id();
        let child = tree
            .create("Pick channels", TaskKind::Branch, 1, Some(root))
            .unwrap()
            .id();
        let root = tree.get(root).unwrap();
        let child = tree.get(child).unwrap();

        let prompt = decomposition_prompt(child, Some(root), 3);
        assert!(prompt.starts_with("Task (level 1):\nPick channels\n"));
        assert!(prompt.contains("Parent task context: Plan a launch"));
        assert!(prompt.contains("EXACTLY 3"));

        let prompt = loop_prompt(child, root);
        assert!(prompt.starts_with("Task (level 1):\nPick channels\n"));
        assert!(prompt.contains("Ancestor task (level 0):\nPlan a launch"));
    }

    #[test]
    fn test_execution_prompt_lists_context() {
        let mut tree = TaskTree::new();
        let id = tree.create("Write intro", TaskKind::Root, 0, None).unwrap().id();
        let task = tree.get(id).unwrap();

        let bare = execution_prompt(task, &ExecutionContext::default());
        assert!(!bare.contains("Context from related tasks"));

        let context = ExecutionContext {
            parent: Some("Write article".to_string()),
            siblings: vec![(TaskId::new(3), "Outline done".to_string())],
        };
        let prompt = execution_prompt(task, &context);
        assert!(prompt.contains("- parent_task: Write article"));
        assert!(prompt.contains("- sibling task_0003: Outline done"));
    }
}
