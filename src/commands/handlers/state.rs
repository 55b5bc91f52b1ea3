//! State command handlers
//!
//! Handles: !lvpdumpstate
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::Result;
use log::error;
use std::sync::Arc;

use crate::commands::command::OutputCode;
use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandBody, Output, Reply};
use crate::features::BotState;

/// Handler for `!lvpdumpstate`: writes every snapshot immediately
pub struct DumpStateHandler {
    pub state: Arc<BotState>,
}

impl CommandBody for DumpStateHandler {
    fn run(&self, ctx: &CommandContext, out: &mut Output) -> Result<Reply> {
        match self.state.save() {
            Ok(files) => {
                out.line(format!("State written: {}.", files.join(", ")));
                Ok(OutputCode::Success.into())
            }
            Err(e) => {
                error!("❌ State dump requested by {} failed: {e}", ctx.nickname);
                out.line(format!("Could not write the state: {e}"));
                Ok(OutputCode::Error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::output::OutputMode;
    use crate::core::level::AccessLevel;

    fn ctx() -> CommandContext {
        CommandContext::new(
            OutputMode::RawProtocol,
            AccessLevel::Management,
            "#bot",
            "Gunther",
            "!lvpdumpstate",
            "",
        )
    }

    #[test]
    fn test_dump_writes_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(BotState::new(dir.path()));
        let handler = DumpStateHandler { state };

        let mut out = Output::new();
        assert_eq!(handler.run(&ctx(), &mut out).unwrap(), Reply::Code(OutputCode::Success));
        assert_eq!(out.captured(), "State written: ingame_crew.json, directives.json.\n");
        assert!(dir.path().join("ingame_crew.json").exists());
        assert!(dir.path().join("directives.json").exists());
    }

    #[test]
    fn test_dump_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();
        let handler = DumpStateHandler {
            state: Arc::new(BotState::new(&blocker)),
        };

        let mut out = Output::new();
        assert_eq!(handler.run(&ctx(), &mut out).unwrap(), Reply::Code(OutputCode::Error));
        assert!(out.captured().starts_with("Could not write the state"));
    }
}
