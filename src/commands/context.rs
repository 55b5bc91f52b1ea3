//! Per-invocation context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Carry the caller's level and output mode instead of shared services
//! - 1.0.0: Initial implementation

use super::output::OutputMode;
use super::trigger::ParsedMessage;
use crate::core::level::AccessLevel;

/// Who invoked a command, where, and with which arguments
///
/// Services a handler needs (roster, query queue, directives) are held by the
/// handler itself; the context only describes this one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    pub mode: OutputMode,
    /// Level the caller runs at
    pub level: AccessLevel,
    /// Channel the command arrived on
    pub channel: String,
    pub nickname: String,
    pub trigger: String,
    /// Argument text after the trigger
    pub params: String,
    /// `params` split on whitespace
    pub args: Vec<String>,
}

impl CommandContext {
    pub fn new(
        mode: OutputMode,
        level: AccessLevel,
        channel: &str,
        nickname: &str,
        trigger: &str,
        params: &str,
    ) -> Self {
        let params = params.trim();
        Self {
            mode,
            level,
            channel: channel.to_string(),
            nickname: nickname.to_string(),
            trigger: trigger.to_string(),
            params: params.to_string(),
            args: params.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn from_message(
        mode: OutputMode,
        level: AccessLevel,
        channel: &str,
        nickname: &str,
        message: ParsedMessage,
    ) -> Self {
        Self {
            mode,
            level,
            channel: channel.to_string(),
            nickname: nickname.to_string(),
            trigger: message.trigger,
            params: message.params,
            args: message.args,
        }
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn is_relayed(&self) -> bool {
        self.mode.is_relayed()
    }
}
