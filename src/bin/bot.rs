use anyhow::{Context as _, Result};
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};

use echobridge::commands::handlers::{register_all, HandlerServices};
use echobridge::commands::{
    parse_message, CommandRouter, OutputMode, OutputRenderer, RenderTargets, Transport,
};
use echobridge::core::{ChannelTable, Config};
use echobridge::database::{ConnectionStatus, Heartbeat, PollStatus, QueryQueue, SqliteStore};
use echobridge::features::directives::{RELAY_CREW_CHAT, RELAY_MAIN_CHAT};
use echobridge::features::BotState;
use echobridge::AccessLevel;

/// Writes protocol lines to stdout
struct StdoutTransport;

impl Transport for StdoutTransport {
    fn send(&self, destination: &str, line: &str) -> bool {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "PRIVMSG {destination} :{line}").is_ok()
    }
}

/// One line of input, by the surface it arrived on
#[derive(Debug, PartialEq, Eq)]
enum Intake<'a> {
    Channel {
        channel: &'a str,
        nickname: &'a str,
        message: &'a str,
    },
    Relayed {
        mode: OutputMode,
        nickname: &'a str,
        message: &'a str,
    },
}

/// `<channel> <nickname> <message>`, `@crew <nickname> <message>` or `@main <nickname> <message>`
fn parse_intake(line: &str) -> Option<Intake<'_>> {
    let mut parts = line.trim().splitn(3, ' ');
    let source = parts.next().filter(|s| !s.is_empty())?;
    let nickname = parts.next().filter(|s| !s.is_empty())?;
    let message = parts.next().unwrap_or_default().trim();

    match source {
        "@crew" => Some(Intake::Relayed {
            mode: OutputMode::RelayedSecondary,
            nickname,
            message,
        }),
        "@main" => Some(Intake::Relayed {
            mode: OutputMode::RelayedPrimary,
            nickname,
            message,
        }),
        channel if channel.starts_with('#') => Some(Intake::Channel {
            channel,
            nickname,
            message,
        }),
        _ => None,
    }
}

fn handle_line(router: &mut CommandRouter, state: &BotState, line: &str) {
    let Some(intake) = parse_intake(line) else {
        debug!("Ignoring malformed intake line: {line}");
        return;
    };

    match intake {
        Intake::Channel {
            channel,
            nickname,
            message,
        } => {
            router.route(channel, nickname, message);
        }
        Intake::Relayed {
            mode,
            nickname,
            message,
        } => {
            let (directive, level) = match mode {
                OutputMode::RelayedSecondary => (RELAY_CREW_CHAT, state.roster.level(nickname)),
                _ => (RELAY_MAIN_CHAT, AccessLevel::None),
            };
            if !state.directives.enabled(directive) {
                debug!("{directive} is disabled, dropping command from {nickname}");
                return;
            }
            if !message.starts_with(router.prefix()) {
                return;
            }
            let parsed = parse_message(message);
            router.route_relayed(level, nickname, &parsed.trigger, &parsed.args, mode);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting echobridge...");

    let channels = ChannelTable::load_or_builtin(&config.channels_config_path)
        .with_context(|| format!("loading {}", config.channels_config_path))?;

    let store = SqliteStore::connect(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path))?;
    let (mut queue, queries) = QueryQueue::new(store);
    let mut heartbeat = Heartbeat::new(config.heartbeat_interval);

    let state = Arc::new(BotState::new(&config.state_dir));
    let restored = state.restore();
    info!("💾 Restored {restored} snapshot(s) from {}", config.state_dir.display());

    let renderer = OutputRenderer::new(Arc::new(StdoutTransport), RenderTargets::from_config(&config));
    let mut router = CommandRouter::new(config.command_prefix, Arc::new(channels), renderer);
    let services = HandlerServices {
        state: state.clone(),
        queries,
    };
    let registered = register_all(&mut router, &services)?;
    info!("⚡ Registered {registered} commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(config.tick_interval);
    let mut heartbeat_tick = tokio::time::interval(config.heartbeat_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&mut router, &state, &line),
                Ok(None) => {
                    info!("Input closed, shutting down");
                    break;
                }
                Err(e) => {
                    error!("❌ Failed to read input: {e}");
                    break;
                }
            },
            _ = tick.tick() => {
                if let PollStatus::SubmissionFailed(id) = queue.poll() {
                    warn!("[{id}] Query rejected before reaching the data store");
                }
                router.poll_deferred();
            }
            _ = heartbeat_tick.tick() => {
                if let Some(ConnectionStatus::ReconnectFailed(_)) = heartbeat.tick(Instant::now(), &mut queue) {
                    warn!("Queued queries are rejected until the data store is back");
                }
            }
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    match state.save() {
        Ok(files) => info!("💾 Saved {}", files.join(", ")),
        Err(e) => error!("❌ Failed to save state: {e}"),
    }
    if router.pending_replies() > 0 {
        warn!("{} command replies were still waiting on queries", router.pending_replies());
    }
    Ok(())
}
