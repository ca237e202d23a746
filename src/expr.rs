// src/expr.rs

//! Condition language for expression links, condition repeats and output
//! checks.
//!
//! A condition is a regular expression matched against a task's published
//! output. A leading `!` negates it: `"!ERROR"` holds when the output does
//! not contain `ERROR`.

use regex::Regex;

use crate::errors::{FlowError, Result};

#[derive(Debug, Clone)]
pub struct Condition {
    pattern: Regex,
    negated: bool,
}

impl Condition {
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        let (negated, pattern) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };

        if pattern.is_empty() {
            return Err(FlowError::Expression(format!(
                "empty condition '{}'",
                source
            )));
        }

        let pattern = Regex::new(pattern)
            .map_err(|e| FlowError::Expression(format!("'{}': {}", source, e)))?;

        Ok(Self { pattern, negated })
    }

    pub fn matches(&self, output: &str) -> bool {
        self.pattern.is_match(output) != self.negated
    }
}

/// Parse and evaluate in one go.
pub fn evaluate(source: &str, output: &str) -> Result<bool> {
    Ok(Condition::parse(source)?.matches(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_pattern_matches_output() {
        let cond = Condition::parse("READY").unwrap();
        assert!(cond.matches("status: READY\n"));
        assert!(!cond.matches("status: PENDING\n"));
    }

    #[test]
    fn bang_negates() {
        let cond = Condition::parse("! ERROR").unwrap();
        assert!(cond.matches("all good"));
        assert!(!cond.matches("ERROR: disk full"));
    }

    #[test]
    fn empty_and_invalid_conditions_are_rejected() {
        assert!(matches!(Condition::parse("  "), Err(FlowError::Expression(_))));
        assert!(matches!(Condition::parse("!"), Err(FlowError::Expression(_))));
        assert!(matches!(Condition::parse("(unclosed"), Err(FlowError::Expression(_))));
    }
}
