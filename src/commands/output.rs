//! # Output Rendering
//!
//! Turns a [`CommandResult`] into transport lines. Raw protocol output keeps its
//! styling and goes to the given destination; the two relayed surfaces strip
//! styling, add their relay prefix and always target their fixed channel.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Classification carried in the result instead of a header line
//! - 1.1.0: Add main chat relay surface
//! - 1.0.0: Initial release

use super::command::{CommandResult, OutputCode};
use crate::core::config::Config;
use crate::core::format::strip_formatting;
use log::{trace, warn};
use std::sync::Arc;

/// Rendering and destination convention for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Protocol channel; output goes to the channel the command came from
    RawProtocol,
    /// In-game crew chat
    RelayedSecondary,
    /// In-game main chat
    RelayedPrimary,
}

impl OutputMode {
    pub fn is_relayed(self) -> bool {
        self != OutputMode::RawProtocol
    }
}

/// Plain-send primitive of the network transport
pub trait Transport: Send + Sync {
    /// Returns `true` when the transport accepted the line
    fn send(&self, destination: &str, line: &str) -> bool;
}

/// Fixed destinations and prefixes the renderer works with
#[derive(Debug, Clone)]
pub struct RenderTargets {
    pub diagnostics_channel: String,
    /// Target of [`OutputMode::RelayedPrimary`]
    pub echo_channel: String,
    /// Target of [`OutputMode::RelayedSecondary`]
    pub crew_channel: String,
    pub main_relay_prefix: String,
    pub crew_relay_prefix: String,
}

impl RenderTargets {
    pub fn from_config(config: &Config) -> Self {
        Self {
            diagnostics_channel: config.diagnostics_channel.clone(),
            echo_channel: config.echo_channel.clone(),
            crew_channel: config.crew_channel.clone(),
            main_relay_prefix: config.main_relay_prefix.clone(),
            crew_relay_prefix: config.crew_relay_prefix.clone(),
        }
    }
}

impl Default for RenderTargets {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Clone)]
pub struct OutputRenderer {
    transport: Arc<dyn Transport>,
    targets: RenderTargets,
}

impl OutputRenderer {
    pub fn new(transport: Arc<dyn Transport>, targets: RenderTargets) -> Self {
        Self { transport, targets }
    }

    pub fn targets(&self) -> &RenderTargets {
        &self.targets
    }

    pub fn diagnostics_channel(&self) -> &str {
        &self.targets.diagnostics_channel
    }

    pub fn render_result(&self, result: &CommandResult, destination: &str, mode: OutputMode) -> usize {
        self.render(result.code, &result.body, destination, mode)
    }

    /// Send every non-empty line of `body`. Returns the number of lines the
    /// transport accepted.
    ///
    /// Error lines are also sent to the diagnostics channel, in their raw
    /// protocol form, unless that is already the destination.
    pub fn render(&self, code: OutputCode, body: &str, destination: &str, mode: OutputMode) -> usize {
        let mut accepted = 0;
        for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let decorated = format!("{}{}", code.prefix(), line);

            let target = self.destination_for(destination, mode);
            let text = match mode {
                OutputMode::RawProtocol => decorated.clone(),
                _ => self.relay_line(&decorated, mode),
            };
            accepted += self.send(target, &text);

            if code == OutputCode::Error && !self.is_diagnostics(target) {
                accepted += self.send(&self.targets.diagnostics_channel, &decorated);
            }
        }
        accepted
    }

    fn destination_for<'a>(&'a self, destination: &'a str, mode: OutputMode) -> &'a str {
        match mode {
            OutputMode::RawProtocol => destination,
            OutputMode::RelayedSecondary => &self.targets.crew_channel,
            OutputMode::RelayedPrimary => &self.targets.echo_channel,
        }
    }

    fn relay_line(&self, line: &str, mode: OutputMode) -> String {
        let stripped = strip_formatting(line);
        let text = stripped.strip_prefix("* ").unwrap_or(&stripped);
        let prefix = match mode {
            OutputMode::RelayedPrimary => &self.targets.main_relay_prefix,
            _ => &self.targets.crew_relay_prefix,
        };
        format!("{prefix}{text}")
    }

    fn is_diagnostics(&self, channel: &str) -> bool {
        channel.eq_ignore_ascii_case(&self.targets.diagnostics_channel)
    }

    fn send(&self, destination: &str, line: &str) -> usize {
        trace!("-> {destination}: {line}");
        if self.transport.send(destination, line) {
            1
        } else {
            warn!("Transport rejected line for {destination}");
            0
        }
    }
}
