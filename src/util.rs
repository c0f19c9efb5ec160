//! Shared utility functions used across the codebase.

use std::str::FromStr;

/// Truncate `text` to at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Truncate for display, appending `...` when anything was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let cut = truncate_chars(text, max_chars);
    if cut.len() < text.len() {
        format!("{}...", cut)
    } else {
        cut.to_string()
    }
}

/// Strip a leading list marker (`1.`, `2)`, `-`, `•`) and surrounding spaces.
pub fn strip_list_marker(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| {
            c.is_ascii_digit() || matches!(c, '.' | '-' | '•' | ')' | ' ' | '*')
        })
        .trim()
}

/// Read an environment variable and parse it, returning `default` if unset.
///
/// # Errors
/// Returns the variable name and parse error text when the value is present
/// but cannot be parsed.
pub fn env_var_parse<T>(name: &str, default: T) -> Result<T, (String, String)>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| (name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
