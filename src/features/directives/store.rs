//! # Directive Store
//!
//! Typed runtime switches addressed as `prefix.name`. Values are validated
//! against the directive's kind when set from chat, and the current values
//! survive restarts through a versioned snapshot.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Integer and text directives
//! - 1.0.0: Boolean relay switches

use crate::core::error::SnapshotError;
use crate::core::snapshot::SnapshotFile;
use dashmap::DashMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Schema version of directive snapshots
pub const DIRECTIVES_VERSION: u32 = 1;

pub const RELAY_CREW_CHAT: &str = "relay.crew_chat";
pub const RELAY_MAIN_CHAT: &str = "relay.main_chat";
pub const PARSER_REPORTS: &str = "parser.reports";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DirectiveValue {
    Boolean(bool),
    Integer(i64),
    Text(String),
}

impl DirectiveValue {
    pub fn kind(&self) -> &'static str {
        match self {
            DirectiveValue::Boolean(_) => "boolean",
            DirectiveValue::Integer(_) => "integer",
            DirectiveValue::Text(_) => "text",
        }
    }

    /// Parse `raw` as a value of the same kind as `self`
    fn parse_like(&self, raw: &str) -> Option<DirectiveValue> {
        match self {
            DirectiveValue::Boolean(_) => parse_bool(raw).map(DirectiveValue::Boolean),
            DirectiveValue::Integer(_) => raw.trim().parse().ok().map(DirectiveValue::Integer),
            DirectiveValue::Text(_) => Some(DirectiveValue::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for DirectiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectiveValue::Boolean(v) => write!(f, "{v}"),
            DirectiveValue::Integer(v) => write!(f, "{v}"),
            DirectiveValue::Text(v) => f.write_str(v),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("unknown directive \"{0}\"")]
    Unknown(String),

    #[error("Invalid value specified for \"{name}\"; {expected} expected.")]
    InvalidValue { name: String, expected: &'static str },
}

/// Outcome of a successful set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveChange {
    pub name: String,
    pub previous: DirectiveValue,
    pub current: DirectiveValue,
}

#[derive(Debug)]
pub struct DirectiveStore {
    values: DashMap<String, DirectiveValue>,
}

impl Default for DirectiveStore {
    fn default() -> Self {
        let store = Self {
            values: DashMap::new(),
        };
        store.define(RELAY_CREW_CHAT, DirectiveValue::Boolean(true));
        store.define(RELAY_MAIN_CHAT, DirectiveValue::Boolean(true));
        store.define(PARSER_REPORTS, DirectiveValue::Boolean(true));
        store
    }
}

impl DirectiveStore {
    /// Store with the built-in directives at their defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directive, or reset an existing one to `default`
    pub fn define(&self, name: &str, default: DirectiveValue) {
        self.values.insert(name.to_lowercase(), default);
    }

    pub fn get(&self, name: &str) -> Option<DirectiveValue> {
        self.values.get(&name.to_lowercase()).map(|v| v.clone())
    }

    /// Current value of a boolean directive; `false` for unknown or non-boolean ones
    pub fn enabled(&self, name: &str) -> bool {
        matches!(self.get(name), Some(DirectiveValue::Boolean(true)))
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(DirectiveValue::Integer(v)) => Some(v),
            _ => None,
        }
    }

    /// Validate `raw` against the directive's kind and store it
    pub fn set(&self, name: &str, raw: &str) -> Result<DirectiveChange, DirectiveError> {
        let key = name.to_lowercase();
        let mut entry = self
            .values
            .get_mut(&key)
            .ok_or_else(|| DirectiveError::Unknown(name.to_string()))?;

        let current = entry
            .parse_like(raw)
            .ok_or_else(|| DirectiveError::InvalidValue {
                name: key.clone(),
                expected: entry.kind(),
            })?;
        let previous = std::mem::replace(&mut *entry, current.clone());
        drop(entry);

        info!("🔧 Directive {key} changed from {previous} to {current}");
        Ok(DirectiveChange {
            name: key,
            previous,
            current,
        })
    }

    /// Directive names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn values(&self) -> BTreeMap<String, DirectiveValue> {
        self.values
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Apply stored values. Unknown directives and values whose kind changed
    /// since they were saved are skipped. Returns the number applied.
    pub fn restore(&self, saved: BTreeMap<String, DirectiveValue>) -> usize {
        let mut applied = 0;
        for (name, value) in saved {
            match self.values.get_mut(&name) {
                Some(mut entry) if entry.kind() == value.kind() => {
                    *entry = value;
                    applied += 1;
                }
                Some(entry) => warn!(
                    "Skipping saved directive {name}: stored as {}, now {}",
                    value.kind(),
                    entry.kind()
                ),
                None => warn!("Skipping saved directive {name}: no longer defined"),
            }
        }
        applied
    }

    pub fn save_state(&self, file: &SnapshotFile) -> Result<(), SnapshotError> {
        file.save(&self.values())
    }

    /// Restore saved values from `file`. Returns whether a snapshot was found.
    pub fn load_state(&self, file: &SnapshotFile) -> Result<bool, SnapshotError> {
        match file.load::<BTreeMap<String, DirectiveValue>>()? {
            Some(saved) => {
                let applied = self.restore(saved);
                info!("🔧 Restored {applied} directive(s)");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
