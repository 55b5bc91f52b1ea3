// Core layer - shared types, configuration and errors
pub mod core;

// Features layer - crew roster and runtime directives
pub mod features;

// Infrastructure - data store, query queue and heartbeat
pub mod database;

// Application layer
pub mod commands;

// Re-export core items
pub use core::{AccessLevel, Config};

pub use commands::{CommandRouter, OutputMode, OutputRenderer, Transport};
pub use database::{QueryQueue, SqliteStore};
pub use features::BotState;
