//! Crew command handlers
//!
//! Handles: !updatecrew, !crewlevel, !tempmod, !tempadmin, !untemp
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: !updatecrew replies once the query settles
//! - 1.0.0: Initial release

use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;

use crate::commands::command::{CommandResult, OutputCode};
use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandBody, Output, Reply};
use crate::core::format::bold;
use crate::database::QueryQueueHandle;
use crate::features::crew::{CrewRoster, UPDATE_CREW_QUERY};

/// Handler for `!updatecrew`: reloads the permanent crew from the database
pub struct UpdateCrewHandler {
    pub roster: Arc<CrewRoster>,
    pub queries: QueryQueueHandle,
}

impl CommandBody for UpdateCrewHandler {
    fn run(&self, ctx: &CommandContext, out: &mut Output) -> Result<Reply> {
        let handle = self.queries.enqueue(UPDATE_CREW_QUERY);
        let roster = self.roster.clone();
        let requested_by = ctx.nickname.clone();

        out.defer(handle, move |result| match result {
            Ok(output) => {
                let counts = roster.replace_permanent(CrewRoster::members_from_rows(&output));
                info!("Crew reloaded for {requested_by}: {} members", counts.total());
                CommandResult::new(OutputCode::Success, format!("Crew updated. {counts}"))
            }
            Err(e) => {
                warn!("⚠️ Crew update for {requested_by} failed: {e}");
                CommandResult::error(format!("Could not update the crew: {e}"))
            }
        });
        Ok(Reply::Silent)
    }
}

/// Handler for `!crewlevel Nickname`
pub struct CrewLevelHandler {
    pub roster: Arc<CrewRoster>,
}

impl CommandBody for CrewLevelHandler {
    fn run(&self, ctx: &CommandContext, out: &mut Output) -> Result<Reply> {
        let Some(nickname) = ctx.arg(0) else {
            out.line(format!("{} Nickname", ctx.trigger));
            return Ok(OutputCode::Usage.into());
        };

        if let Some(level) = self.roster.permanent_level(nickname) {
            out.line(format!("{} is {level} crew.", bold(nickname)));
        } else if let Some(level) = self.roster.temporary_level(nickname) {
            out.line(format!("{} is temporary {level} crew.", bold(nickname)));
        } else {
            out.line(format!("{} is not part of the crew.", bold(nickname)));
        }
        Ok(OutputCode::Info.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempRight {
    Moderator,
    Administrator,
}

impl TempRight {
    fn name(self) -> &'static str {
        match self {
            TempRight::Moderator => "moderator",
            TempRight::Administrator => "administrator",
        }
    }
}

/// Handler for `!tempmod` and `!tempadmin`
pub struct TempRightsHandler {
    pub roster: Arc<CrewRoster>,
    pub right: TempRight,
}

impl CommandBody for TempRightsHandler {
    fn run(&self, ctx: &CommandContext, out: &mut Output) -> Result<Reply> {
        let Some(nickname) = ctx.arg(0) else {
            out.line(format!("{} Nickname", ctx.trigger));
            return Ok(OutputCode::Usage.into());
        };

        if self.roster.is_permanent_crew(nickname) {
            out.line(format!("{} already is a crew member.", bold(nickname)));
            return Ok(OutputCode::Error.into());
        }

        match self.right {
            TempRight::Moderator => self.roster.add_temp_mod(nickname, &ctx.nickname),
            TempRight::Administrator => self.roster.add_temp_admin(nickname, &ctx.nickname),
        }
        out.line(format!(
            "{} has been given temporary {} rights.",
            bold(nickname),
            self.right.name()
        ));
        Ok(OutputCode::Success.into())
    }
}

/// Handler for `!untemp Nickname`
pub struct UntempHandler {
    pub roster: Arc<CrewRoster>,
}

impl CommandBody for UntempHandler {
    fn run(&self, ctx: &CommandContext, out: &mut Output) -> Result<Reply> {
        let Some(nickname) = ctx.arg(0) else {
            out.line(format!("{} Nickname", ctx.trigger));
            return Ok(OutputCode::Usage.into());
        };

        if self.roster.remove_temporary(nickname) {
            out.line(format!(
                "Temporary rights of {} have been removed.",
                bold(nickname)
            ));
            Ok(OutputCode::Success.into())
        } else {
            out.line(format!("{} has no temporary rights.", bold(nickname)));
            Ok(OutputCode::Error.into())
        }
    }
}
