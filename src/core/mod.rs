//! # Core Module
//!
//! Shared types, configuration, formatting and error handling.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Add access levels, channel table and versioned snapshots
//! - 1.1.0: Add protocol formatting helpers
//! - 1.0.0: Initial creation with config module

pub mod channels;
pub mod config;
pub mod error;
pub mod format;
pub mod level;
pub mod snapshot;

// Re-export commonly used items
pub use channels::{ChannelLevelLookup, ChannelTable};
pub use config::Config;
pub use error::{CommandError, QueryError, RegistrationError, SnapshotError, StoreError};
pub use format::strip_formatting;
pub use level::AccessLevel;
pub use snapshot::SnapshotFile;
