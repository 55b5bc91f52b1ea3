//! # Error Taxonomy
//!
//! Typed errors for command routing, registration, queries and snapshots.
//! Handler bodies and the binary use `anyhow`; these types mark the seams where
//! callers branch on what went wrong.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.2.0: Add SnapshotError for versioned state files
//! - 1.1.0: Split QueryError into submission and execution failures
//! - 1.0.0: Initial release

use crate::core::level::AccessLevel;
use thiserror::Error;

/// Failures raised while invoking a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("This command can only be executed with level {required} or higher.")]
    AccessDenied {
        required: AccessLevel,
        actual: AccessLevel,
    },

    #[error("{0}")]
    HandlerFailure(#[source] anyhow::Error),
}

impl CommandError {
    /// Static code for log lines
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AccessDenied { .. } => "access_denied",
            Self::HandlerFailure(_) => "handler_failure",
        }
    }
}

/// Malformed command registrations. Fatal at wiring time.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("trigger \"{trigger}\" does not start with the command prefix '{prefix}'")]
    MissingPrefix { trigger: String, prefix: char },

    #[error("trigger is empty")]
    EmptyTrigger,

    #[error("invalid trigger pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unsupported flag '{flag}' in trigger pattern \"{pattern}\"")]
    UnsupportedFlag { pattern: String, flag: char },

    #[error("trigger \"{0}\" cannot be registered at the unrecognized level")]
    UnrestrictedLevel(String),
}

/// Failures reported by a data-store connection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] sqlite::Error),

    #[error("connection to the data store is gone")]
    Disconnected,

    #[error("a query is already in flight on this connection")]
    Busy,

    #[error("{0}")]
    Other(String),
}

/// Why a queued query was rejected.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("submitting query failed: {0}")]
    Submission(#[source] StoreError),

    #[error("executing query failed: {0}")]
    Execution(#[source] StoreError),

    #[error("connection was reset while the query was in flight")]
    ConnectionReset,

    #[error("query queue is no longer running")]
    QueueClosed,

    #[error("query was dropped before completing")]
    Abandoned,
}

impl QueryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Submission(_) => "query_submission",
            Self::Execution(_) => "query_execution",
            Self::ConnectionReset => "connection_reset",
            Self::QueueClosed => "queue_closed",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Failures loading or saving a versioned state snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {path} is malformed: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot {path} has version {found}, expected {expected}")]
    VersionMismatch {
        path: String,
        expected: u32,
        found: u32,
    },
}
