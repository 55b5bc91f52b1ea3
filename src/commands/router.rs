//! # Command Router
//!
//! Resolves incoming chat lines to commands, runs them at the caller's level
//! and hands their results to the [`OutputRenderer`]. Failures are reported to
//! the diagnostics channel and never stop the router from taking the next line.
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.0: Deferred replies rendered from the tick loop
//! - 2.0.0: Typed errors instead of exceptions as control flow
//! - 1.1.0: Relayed entry point for crew and main chat
//! - 1.0.0: Initial release

use super::command::{Command, OutputCode};
use super::context::CommandContext;
use super::handler::{CommandBody, Deferred, Output, Reply};
use super::output::{OutputMode, OutputRenderer};
use super::registry::TriggerRegistry;
use super::trigger::{parse_message, ParsedMessage, Trigger};
use crate::core::channels::ChannelLevelLookup;
use crate::core::error::{CommandError, RegistrationError};
use crate::core::level::AccessLevel;
use log::{debug, info, warn};
use std::sync::Arc;

/// What happened to one routed line
#[derive(Debug)]
pub enum RouteOutcome {
    /// The line does not start with the command prefix
    NotACommand,
    /// No command is registered for the trigger
    NoMatch,
    Executed {
        /// Lines accepted by the transport
        lines: usize,
        /// Replies still waiting on queued queries
        deferred: usize,
    },
    /// Reported to the diagnostics channel
    Failed(CommandError),
}

impl RouteOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, RouteOutcome::Executed { .. })
    }
}

struct PendingReply {
    deferred: Deferred,
    destination: String,
    mode: OutputMode,
    trigger: String,
}

pub struct CommandRouter {
    prefix: char,
    registry: TriggerRegistry,
    channels: Arc<dyn ChannelLevelLookup>,
    renderer: OutputRenderer,
    pending: Vec<PendingReply>,
}

impl CommandRouter {
    pub fn new(prefix: char, channels: Arc<dyn ChannelLevelLookup>, renderer: OutputRenderer) -> Self {
        Self {
            prefix,
            registry: TriggerRegistry::new(),
            channels,
            renderer,
            pending: Vec::new(),
        }
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    pub fn registry(&self) -> &TriggerRegistry {
        &self.registry
    }

    pub fn renderer(&self) -> &OutputRenderer {
        &self.renderer
    }

    /// Replies still waiting on their queries
    pub fn pending_replies(&self) -> usize {
        self.pending.len()
    }

    pub fn register(&mut self, command: Command) {
        debug!("Registered {} at level {}", command.trigger(), command.level());
        self.registry.register(command);
    }

    /// Parse `trigger` and register an inline body under it
    pub fn register_command<F>(
        &mut self,
        trigger: &str,
        level: AccessLevel,
        body: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&CommandContext, &mut Output) -> anyhow::Result<Reply> + Send + Sync + 'static,
    {
        let command = Command::new(Trigger::parse(trigger, self.prefix)?, level, body)?;
        self.register(command);
        Ok(())
    }

    /// Parse `trigger` and register a handler struct under it
    pub fn register_handler(
        &mut self,
        trigger: &str,
        level: AccessLevel,
        body: Arc<dyn CommandBody>,
    ) -> Result<(), RegistrationError> {
        let command = Command::with_body(Trigger::parse(trigger, self.prefix)?, level, body)?;
        self.register(command);
        Ok(())
    }

    pub fn unregister_command(&mut self, trigger: &str) -> Result<bool, RegistrationError> {
        let trigger = Trigger::parse(trigger, self.prefix)?;
        Ok(self.registry.unregister(&trigger))
    }

    /// Route a line received on a protocol channel. The caller runs at the
    /// channel's configured level; unknown channels run below every level.
    pub fn route(&mut self, channel: &str, nickname: &str, line: &str) -> RouteOutcome {
        if !line.starts_with(self.prefix) {
            return RouteOutcome::NotACommand;
        }

        let level = self
            .channels
            .channel_level(channel)
            .unwrap_or(AccessLevel::Unrecognized);
        let ctx = CommandContext::from_message(
            OutputMode::RawProtocol,
            level,
            channel,
            nickname,
            parse_message(line),
        );
        self.dispatch(ctx, channel)
    }

    /// Route a command from one of the relayed in-game surfaces, already split
    /// into trigger and arguments, at a level the caller determined.
    pub fn route_relayed(
        &mut self,
        level: AccessLevel,
        nickname: &str,
        trigger: &str,
        args: &[String],
        mode: OutputMode,
    ) -> RouteOutcome {
        let params = args.join(" ");
        let message = ParsedMessage {
            trigger: trigger.to_string(),
            args: params.split_whitespace().map(str::to_string).collect(),
            params,
        };
        let channel = self.renderer.targets().echo_channel.clone();
        let ctx = CommandContext::from_message(mode, level, &channel, nickname, message);
        self.dispatch(ctx, &channel)
    }

    fn dispatch(&mut self, ctx: CommandContext, destination: &str) -> RouteOutcome {
        let Some(command) = self.registry.resolve(&ctx.trigger) else {
            return RouteOutcome::NoMatch;
        };

        match command.invoke(&ctx) {
            Ok(invocation) => {
                info!(
                    "⚡ {} ran {} in {} at level {}",
                    ctx.nickname, ctx.trigger, ctx.channel, ctx.level
                );
                let lines = self
                    .renderer
                    .render_result(&invocation.result, destination, ctx.mode);

                let deferred = invocation.deferred.len();
                for reply in invocation.deferred {
                    self.pending.push(PendingReply {
                        deferred: reply,
                        destination: destination.to_string(),
                        mode: ctx.mode,
                        trigger: ctx.trigger.clone(),
                    });
                }
                RouteOutcome::Executed { lines, deferred }
            }
            Err(e) => {
                warn!(
                    "⚠️ [{}] {} by {} in {}: {}",
                    e.error_code(),
                    ctx.trigger,
                    ctx.nickname,
                    ctx.channel,
                    e
                );
                self.report_failure(&ctx, &e);
                RouteOutcome::Failed(e)
            }
        }
    }

    fn report_failure(&self, ctx: &CommandContext, error: &CommandError) {
        let message = format!(
            "Command {} by {} in {} failed: {}",
            ctx.trigger, ctx.nickname, ctx.channel, error
        );
        let diagnostics = self.renderer.diagnostics_channel().to_string();
        self.renderer
            .render(OutputCode::Error, &message, &diagnostics, OutputMode::RawProtocol);
    }

    /// Render the replies whose queries have settled, in the order their
    /// commands ran. Call after the query queue's poll on every tick.
    pub fn poll_deferred(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let mut completed = 0;
        let mut waiting = Vec::with_capacity(self.pending.len());
        for pending in std::mem::take(&mut self.pending) {
            let PendingReply {
                deferred,
                destination,
                mode,
                trigger,
            } = pending;
            match deferred.try_complete() {
                Ok(result) => {
                    debug!("Deferred reply for {trigger} ready");
                    self.renderer.render_result(&result, &destination, mode);
                    completed += 1;
                }
                Err(deferred) => waiting.push(PendingReply {
                    deferred,
                    destination,
                    mode,
                    trigger,
                }),
            }
        }
        self.pending = waiting;
        completed
    }
}
