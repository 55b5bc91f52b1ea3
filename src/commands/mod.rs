//! # Command System
//!
//! Trigger registry, leveled command invocation, routing and output rendering.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Pattern triggers, typed results and deferred replies
//! - 2.1.0: Built-in crew, directive and queue handlers
//! - 1.0.0: Literal triggers with channel levels

pub mod command;
pub mod context;
pub mod handler;
pub mod handlers;
pub mod output;
pub mod registry;
pub mod router;
pub mod trigger;

pub use command::{Command, CommandResult, Invocation, OutputCode};
pub use context::CommandContext;
pub use handler::{CommandBody, Deferred, Output, Reply};
pub use output::{OutputMode, OutputRenderer, RenderTargets, Transport};
pub use registry::TriggerRegistry;
pub use router::{CommandRouter, RouteOutcome};
pub use trigger::{parse_message, ParsedMessage, Trigger};
