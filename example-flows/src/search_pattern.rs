//! Filter pattern entry with live validation.

use std::sync::Arc;

use async_trait::async_trait;
use stepwise::{InputBox, InputBoxPrompter, PromptEnv, Validator};

/// Longest filter pattern the log service accepts.
pub const MAX_PATTERN_LEN: usize = 1024;

/// Judges filter patterns.
///
/// The outer result reports whether the check could be made at all; the
/// inner one carries the message shown to the user.
#[async_trait]
pub trait PatternChecker: Send + Sync {
    async fn check(&self, pattern: &str) -> anyhow::Result<Result<(), String>>;
}

/// A local syntax check of filter patterns.
///
/// Accepts plain terms, quoted phrases, JSON selectors (`{ $.level = "ERROR" }`)
/// and space-delimited field lists (`[ip, user, ...]`). Only the structure is
/// checked: quotes closed, brackets balanced, JSON selectors rooted at `$`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePatternChecker;

#[async_trait]
impl PatternChecker for SimplePatternChecker {
    async fn check(&self, pattern: &str) -> anyhow::Result<Result<(), String>> {
        Ok(check_pattern(pattern))
    }
}

pub fn check_pattern(pattern: &str) -> Result<(), String> {
    if pattern.len() > MAX_PATTERN_LEN {
        return Err(format!("Pattern is longer than {MAX_PATTERN_LEN} characters"));
    }

    let mut open = Vec::new();
    let mut quoted = false;
    let mut escaped = false;
    for c in pattern.chars() {
        if quoted {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => quoted = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => quoted = true,
            '{' | '[' | '(' => open.push(c),
            '}' | ']' | ')' => {
                let expected = match c {
                    '}' => '{',
                    ']' => '[',
                    _ => '(',
                };
                if open.pop() != Some(expected) {
                    return Err(format!("Unexpected '{c}'"));
                }
            }
            _ => {}
        }
    }
    if quoted {
        return Err("Unterminated quote".to_string());
    }
    if let Some(c) = open.pop() {
        return Err(format!("Unclosed '{c}'"));
    }

    let trimmed = pattern.trim();
    if let Some(selector) = trimmed.strip_prefix('{') {
        if !trimmed.ends_with('}') {
            return Err("JSON patterns must be wrapped in { }".to_string());
        }
        let selector = selector.trim_start_matches(|c: char| c == '(' || c.is_whitespace());
        if !selector.starts_with("$.") {
            return Err("JSON selectors start with $.".to_string());
        }
    }
    Ok(())
}

/// An input box for a filter pattern, checked on every change.
///
/// An empty pattern matches every event.
pub fn search_pattern_prompter(
    env: &PromptEnv,
    checker: Arc<dyn PatternChecker>,
) -> InputBoxPrompter {
    InputBox::new(env)
        .with_title("Search pattern")
        .with_placeholder("Filter pattern, empty to match everything")
        .with_back_button()
        .with_validator(Validator::from_async(move |pattern: String| {
            let checker = Arc::clone(&checker);
            async move { checker.check(&pattern).await }
        }))
}
