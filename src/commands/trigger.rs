//! # Triggers
//!
//! The text that selects a command: either a literal trigger starting with the
//! command prefix, or a pattern written as `/expression/flags`.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Patterns keep their source text as identity
//! - 1.0.0: Initial release

use crate::core::error::RegistrationError;
use regex::{Regex, RegexBuilder};
use std::fmt;

#[derive(Debug, Clone)]
pub enum Trigger {
    /// Exact, case-sensitive match on the trigger text
    Literal(String),
    /// Regular expression tested against the trigger text
    Pattern { source: String, regex: Regex },
}

impl Trigger {
    /// Parse a trigger as written at registration time.
    ///
    /// `/expr/flags` produces a pattern (supported flags: `i`, `m`, `s`, `x`);
    /// anything else is a literal and must start with `prefix`.
    pub fn parse(text: &str, prefix: char) -> Result<Self, RegistrationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RegistrationError::EmptyTrigger);
        }

        if let Some(rest) = text.strip_prefix('/') {
            if let Some(end) = rest.rfind('/') {
                return Self::pattern(text, &rest[..end], &rest[end + 1..]);
            }
        }

        if !text.starts_with(prefix) {
            return Err(RegistrationError::MissingPrefix {
                trigger: text.to_string(),
                prefix,
            });
        }
        if text.len() == prefix.len_utf8() {
            return Err(RegistrationError::EmptyTrigger);
        }
        Ok(Trigger::Literal(text.to_string()))
    }

    fn pattern(source: &str, expression: &str, flags: &str) -> Result<Self, RegistrationError> {
        let invalid = |source_err: regex::Error| RegistrationError::InvalidPattern {
            pattern: source.to_string(),
            source: source_err,
        };
        if expression.is_empty() {
            return Err(RegistrationError::EmptyTrigger);
        }

        let mut builder = RegexBuilder::new(expression);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                other => {
                    return Err(RegistrationError::UnsupportedFlag {
                        pattern: source.to_string(),
                        flag: other,
                    })
                }
            };
        }

        let regex = builder.build().map_err(invalid)?;
        Ok(Trigger::Pattern {
            source: source.to_string(),
            regex,
        })
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Trigger::Pattern { .. })
    }

    /// The trigger as written; identity for replacement and removal
    pub fn as_str(&self) -> &str {
        match self {
            Trigger::Literal(text) => text,
            Trigger::Pattern { source, .. } => source,
        }
    }

    pub fn matches(&self, trigger_text: &str) -> bool {
        match self {
            Trigger::Literal(text) => text == trigger_text,
            Trigger::Pattern { regex, .. } => regex.is_match(trigger_text),
        }
    }
}

impl PartialEq for Trigger {
    fn eq(&self, other: &Self) -> bool {
        self.is_pattern() == other.is_pattern() && self.as_str() == other.as_str()
    }
}

impl Eq for Trigger {}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat line split into trigger and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub trigger: String,
    /// Everything after the trigger, with surrounding whitespace removed
    pub params: String,
    /// `params` split on runs of whitespace
    pub args: Vec<String>,
}

/// Split a chat line: the first whitespace-delimited token is the trigger.
pub fn parse_message(line: &str) -> ParsedMessage {
    let line = line.trim();
    let (trigger, params) = match line.find(char::is_whitespace) {
        Some(idx) => (&line[..idx], line[idx..].trim()),
        None => (line, ""),
    };

    ParsedMessage {
        trigger: trigger.to_string(),
        params: params.to_string(),
        args: params.split_whitespace().map(str::to_string).collect(),
    }
}
