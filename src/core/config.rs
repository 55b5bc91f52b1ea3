//! # Configuration
//!
//! Environment-driven settings for the bot host. Values come from the process
//! environment, optionally seeded from a `.env` file by the binary.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Add heartbeat and tick intervals
//! - 1.1.0: Add relay prefixes and state directory
//! - 1.0.0: Initial release

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// First character of every command trigger
    pub command_prefix: char,
    /// Fixed channel for the primary relayed surface (main chat)
    pub echo_channel: String,
    /// Fixed channel for the secondary relayed surface (crew chat)
    pub crew_channel: String,
    /// Receives error output and router-caught failures
    pub diagnostics_channel: String,
    pub crew_relay_prefix: String,
    pub main_relay_prefix: String,
    pub database_path: String,
    pub state_dir: PathBuf,
    pub channels_config_path: String,
    pub tick_interval: Duration,
    pub heartbeat_interval: Duration,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_prefix: '!',
            echo_channel: "#lvp.echo".to_string(),
            crew_channel: "#lvp.crew".to_string(),
            diagnostics_channel: "#bot".to_string(),
            crew_relay_prefix: "!admin ".to_string(),
            main_relay_prefix: "!msg ".to_string(),
            database_path: "echobridge.db".to_string(),
            state_dir: PathBuf::from("data"),
            channels_config_path: "channels.yaml".to_string(),
            tick_interval: Duration::from_millis(100),
            heartbeat_interval: Duration::from_secs(30),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; missing keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let command_prefix = match lookup("COMMAND_PREFIX") {
            Some(value) => {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() => c,
                    _ => {
                        return Err(anyhow::anyhow!(
                            "COMMAND_PREFIX must be a single non-space character, got {:?}",
                            value
                        ))
                    }
                }
            }
            None => defaults.command_prefix,
        };

        let channel = |key: &str, default: String| -> Result<String> {
            match lookup(key) {
                Some(value) if value.starts_with('#') => Ok(value.to_lowercase()),
                Some(value) => Err(anyhow::anyhow!("{} must be a channel name, got {}", key, value)),
                None => Ok(default),
            }
        };

        let millis = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(value) => Ok(Duration::from_millis(value.parse().map_err(|e| {
                    anyhow::anyhow!("{} must be a number of milliseconds: {}", key, e)
                })?)),
                None => Ok(default),
            }
        };

        let seconds = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(value) => Ok(Duration::from_secs(value.parse().map_err(|e| {
                    anyhow::anyhow!("{} must be a number of seconds: {}", key, e)
                })?)),
                None => Ok(default),
            }
        };

        let tick_interval = millis("TICK_INTERVAL_MS", defaults.tick_interval)?;
        if tick_interval.is_zero() {
            return Err(anyhow::anyhow!("TICK_INTERVAL_MS must be greater than zero"));
        }
        let heartbeat_interval = seconds("HEARTBEAT_INTERVAL_SECS", defaults.heartbeat_interval)?;
        if heartbeat_interval.is_zero() {
            return Err(anyhow::anyhow!("HEARTBEAT_INTERVAL_SECS must be greater than zero"));
        }

        Ok(Config {
            command_prefix,
            echo_channel: channel("ECHO_CHANNEL", defaults.echo_channel)?,
            crew_channel: channel("CREW_CHANNEL", defaults.crew_channel)?,
            diagnostics_channel: channel("DIAGNOSTICS_CHANNEL", defaults.diagnostics_channel)?,
            crew_relay_prefix: defaults.crew_relay_prefix,
            main_relay_prefix: defaults.main_relay_prefix,
            database_path: lookup("DATABASE_PATH").unwrap_or(defaults.database_path),
            state_dir: lookup("STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_dir),
            channels_config_path: lookup("CHANNELS_CONFIG_PATH")
                .unwrap_or(defaults.channels_config_path),
            tick_interval,
            heartbeat_interval,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}
