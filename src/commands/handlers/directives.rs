//! Directive command handlers
//!
//! Handles: !lvpget, !lvpset, !lvpdirectives
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::Result;
use std::sync::Arc;

use crate::commands::command::OutputCode;
use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandBody, Output, Reply};
use crate::features::directives::{DirectiveError, DirectiveStore};

/// Points the caller at the directive overview
fn unknown_directive(prefix: char) -> String {
    format!("Unknown directive, please see {prefix}lvpdirectives.")
}

/// Handler for `!lvpget Directive`
pub struct GetDirectiveHandler {
    pub directives: Arc<DirectiveStore>,
    pub prefix: char,
}

impl CommandBody for GetDirectiveHandler {
    fn run(&self, ctx: &CommandContext, out: &mut Output) -> Result<Reply> {
        let Some(name) = ctx.arg(0) else {
            out.line(format!("{} Directive", ctx.trigger));
            return Ok(OutputCode::Usage.into());
        };

        match self.directives.get(name) {
            Some(value) => {
                out.line(format!("Current value of \"{}\": {value}", name.to_lowercase()));
                Ok(OutputCode::Info.into())
            }
            None => {
                out.line(unknown_directive(self.prefix));
                Ok(OutputCode::Error.into())
            }
        }
    }
}

/// Handler for `!lvpset Directive Value`
pub struct SetDirectiveHandler {
    pub directives: Arc<DirectiveStore>,
    pub prefix: char,
}

impl CommandBody for SetDirectiveHandler {
    fn run(&self, ctx: &CommandContext, out: &mut Output) -> Result<Reply> {
        let (Some(name), Some(_)) = (ctx.arg(0), ctx.arg(1)) else {
            out.line(format!("{} Directive Value", ctx.trigger));
            return Ok(OutputCode::Usage.into());
        };
        let raw = ctx.args[1..].join(" ");

        match self.directives.set(name, &raw) {
            Ok(change) => {
                out.line(format!(
                    "Changed value of \"{}\" from {} to {}.",
                    change.name, change.previous, change.current
                ));
                Ok(OutputCode::Info.into())
            }
            Err(DirectiveError::Unknown(_)) => {
                out.line(unknown_directive(self.prefix));
                Ok(OutputCode::Error.into())
            }
            Err(e) => {
                out.line(e.to_string());
                Ok(OutputCode::Error.into())
            }
        }
    }
}

/// Handler for `!lvpdirectives`
pub struct ListDirectivesHandler {
    pub directives: Arc<DirectiveStore>,
}

impl CommandBody for ListDirectivesHandler {
    fn run(&self, _ctx: &CommandContext, out: &mut Output) -> Result<Reply> {
        out.line(format!(
            "Available directives: {}",
            self.directives.names().join(", ")
        ));
        Ok(OutputCode::Info.into())
    }
}
