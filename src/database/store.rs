//! Data-store connection contract and query results
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.0.0: Initial release

use crate::core::error::StoreError;
use std::collections::HashMap;

/// A connection that runs one query at a time without blocking its caller.
///
/// The async query queue is the only owner of a `DataStore`; nothing else
/// submits work to it while the queue is running.
pub trait DataStore: Send {
    /// Start executing `sql`. Fails with [`StoreError::Busy`] if a query is
    /// still outstanding.
    fn submit(&mut self, sql: &str) -> Result<(), StoreError>;

    /// Completion check for the outstanding query. `None` while it runs.
    fn reap(&mut self) -> Option<Result<QueryOutput, StoreError>>;

    /// Health check. Must not wait on the connection; an implementation may
    /// report the answer to an earlier check instead.
    fn ping(&mut self) -> Result<(), StoreError>;

    /// Drop the current connection and start opening a fresh one. Any
    /// outstanding query is lost.
    fn reconnect(&mut self) -> Result<(), StoreError>;
}

/// One result row, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: HashMap<String, Option<String>>,
}

impl Row {
    pub fn new(values: HashMap<String, Option<String>>) -> Self {
        Self { values }
    }

    /// Text value of a column; `None` for NULL or unknown columns
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).and_then(|v| v.as_deref())
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(|v| v.trim().parse().ok())
    }

    pub fn get_bool(&self, column: &str) -> bool {
        matches!(self.get(column), Some(v) if v != "0" && !v.is_empty())
    }
}

impl<const N: usize> From<[(&str, Option<&str>); N]> for Row {
    fn from(pairs: [(&str, Option<&str>); N]) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
        )
    }
}

/// Result of a completed query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Rows changed by a data-modifying statement
    pub affected_rows: usize,
}

impl QueryOutput {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            columns: Vec::new(),
            rows,
            affected_rows: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Quote a value for interpolation inside a single-quoted SQL literal
pub fn escape(value: &str) -> String {
    value.replace('\'', "''")
}
