//! # Database Module
//!
//! Data-store connection, single-flight async query queue and heartbeat.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.4.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Replace the shared connection with a queue-owned store
//! - 1.0.0: Initial release

pub mod heartbeat;
pub mod query;
pub mod queue;
pub mod sqlite;
pub mod store;

pub use heartbeat::Heartbeat;
pub use query::{AsyncQuery, QueryHandle, QueryResult, QueryState};
pub use queue::{ConnectionStatus, PollStatus, QueryQueue, QueryQueueHandle, QueueSnapshot};
pub use sqlite::SqliteStore;
pub use store::{escape, DataStore, QueryOutput, Row};
