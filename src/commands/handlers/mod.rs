//! Per-command handler implementations
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.2.0: Add QueueStatusHandler (queue)
//! - 1.1.0: Add DumpStateHandler (lvpdumpstate)
//! - 1.0.0: Crew and directive handlers

pub mod crew;
pub mod directives;
pub mod queue;
pub mod state;

use std::sync::Arc;

use super::handler::CommandBody;
use super::router::CommandRouter;
use crate::core::error::RegistrationError;
use crate::core::level::AccessLevel;
use crate::database::QueryQueueHandle;
use crate::features::BotState;
use crew::TempRight;

/// Shared services the built-in commands close over
#[derive(Clone)]
pub struct HandlerServices {
    pub state: Arc<BotState>,
    pub queries: QueryQueueHandle,
}

/// Create all built-in command handlers with the trigger and level each is
/// registered under. Triggers start with `prefix`.
pub fn create_all_handlers(
    services: &HandlerServices,
    prefix: char,
) -> Vec<(String, AccessLevel, Arc<dyn CommandBody>)> {
    let roster = &services.state.roster;
    let directives = &services.state.directives;
    let handlers: Vec<(&str, AccessLevel, Arc<dyn CommandBody>)> = vec![
        (
            "lvpget",
            AccessLevel::Management,
            Arc::new(directives::GetDirectiveHandler {
                directives: directives.clone(),
                prefix,
            }),
        ),
        (
            "lvpset",
            AccessLevel::Management,
            Arc::new(directives::SetDirectiveHandler {
                directives: directives.clone(),
                prefix,
            }),
        ),
        (
            "lvpdirectives",
            AccessLevel::Management,
            Arc::new(directives::ListDirectivesHandler {
                directives: directives.clone(),
            }),
        ),
        (
            "updatecrew",
            AccessLevel::Moderator,
            Arc::new(crew::UpdateCrewHandler {
                roster: roster.clone(),
                queries: services.queries.clone(),
            }),
        ),
        (
            "crewlevel",
            AccessLevel::None,
            Arc::new(crew::CrewLevelHandler {
                roster: roster.clone(),
            }),
        ),
        (
            "tempmod",
            AccessLevel::Administrator,
            Arc::new(crew::TempRightsHandler {
                roster: roster.clone(),
                right: TempRight::Moderator,
            }),
        ),
        (
            "tempadmin",
            AccessLevel::Administrator,
            Arc::new(crew::TempRightsHandler {
                roster: roster.clone(),
                right: TempRight::Administrator,
            }),
        ),
        (
            "untemp",
            AccessLevel::Administrator,
            Arc::new(crew::UntempHandler {
                roster: roster.clone(),
            }),
        ),
        (
            "lvpdumpstate",
            AccessLevel::Management,
            Arc::new(state::DumpStateHandler {
                state: services.state.clone(),
            }),
        ),
        (
            "queue",
            AccessLevel::Developer,
            Arc::new(queue::QueueStatusHandler {
                queries: services.queries.clone(),
            }),
        ),
    ];

    handlers
        .into_iter()
        .map(|(name, level, body)| (format!("{prefix}{name}"), level, body))
        .collect()
}

/// Register every built-in command with `router`
pub fn register_all(
    router: &mut CommandRouter,
    services: &HandlerServices,
) -> Result<usize, RegistrationError> {
    let handlers = create_all_handlers(services, router.prefix());
    let count = handlers.len();
    for (trigger, level, body) in handlers {
        router.register_handler(&trigger, level, body)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::output::tests::RecordingTransport;
    use crate::commands::output::{OutputMode, OutputRenderer, RenderTargets};
    use crate::commands::router::RouteOutcome;
    use crate::core::channels::ChannelTable;
    use crate::core::error::CommandError;
    use crate::database::queue::tests::StubStore;
    use crate::database::{PollStatus, QueryQueue};

    struct Fixture {
        transport: Arc<RecordingTransport>,
        router: CommandRouter,
        queue: QueryQueue<StubStore>,
        services: HandlerServices,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        fixture_with_prefix('!')
    }

    fn fixture_with_prefix(prefix: char) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(RecordingTransport::default());
        let renderer = OutputRenderer::new(transport.clone(), RenderTargets::default());
        let mut router = CommandRouter::new(prefix, Arc::new(ChannelTable::builtin()), renderer);
        let (queue, queries) = QueryQueue::new(StubStore::default());
        let services = HandlerServices {
            state: Arc::new(BotState::new(dir.path())),
            queries,
        };
        assert_eq!(register_all(&mut router, &services).unwrap(), 10);
        Fixture {
            transport,
            router,
            queue,
            services,
            _dir: dir,
        }
    }

    #[test]
    fn test_all_triggers_registered() {
        let f = fixture();
        for trigger in ["!lvpget", "!updatecrew", "!crewlevel", "!untemp", "!queue"] {
            assert!(f.router.registry().resolve(trigger).is_some(), "{trigger}");
        }
        assert!(f.router.registry().resolve("!nothing").is_none());
    }

    #[test]
    fn test_custom_prefix_registers_and_routes() {
        let mut f = fixture_with_prefix('.');
        assert!(f.router.registry().resolve("!crewlevel").is_none());

        let outcome = f.router.route("#lvp", "Visitor", ".crewlevel");
        assert!(outcome.is_executed());
        let outcome = f.router.route("#lvp.management", "Gunther", ".lvpget no.such");
        assert!(outcome.is_executed());
        assert_eq!(
            f.transport.lines(),
            vec![
                ("#lvp".to_string(), "\x0310* Usage: .crewlevel Nickname".to_string()),
                (
                    "#lvp.management".to_string(),
                    "\x034* Error: Unknown directive, please see .lvpdirectives.".to_string()
                ),
                (
                    "#bot".to_string(),
                    "\x034* Error: Unknown directive, please see .lvpdirectives.".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_management_command_refused_in_public_channel() {
        let mut f = fixture();
        let outcome = f.router.route("#lvp", "Visitor", "!lvpset relay.main_chat off");
        assert!(matches!(
            outcome,
            RouteOutcome::Failed(CommandError::AccessDenied { .. })
        ));
        assert!(f.services.state.directives.enabled("relay.main_chat"));
    }

    #[test]
    fn test_directive_set_from_management_channel() {
        let mut f = fixture();
        let outcome = f.router.route("#lvp.management", "Gunther", "!lvpset relay.main_chat off");
        assert!(outcome.is_executed());
        assert!(!f.services.state.directives.enabled("relay.main_chat"));
        assert_eq!(
            f.transport.lines(),
            vec![(
                "#lvp.management".to_string(),
                "\x0310* Info: Changed value of \"relay.main_chat\" from true to false.".to_string()
            )]
        );
    }

    #[test]
    fn test_relayed_crewlevel_goes_to_crew_channel() {
        let mut f = fixture();
        let outcome = f.router.route_relayed(
            AccessLevel::None,
            "Visitor",
            "!crewlevel",
            &["Visitor".to_string()],
            OutputMode::RelayedSecondary,
        );
        assert!(outcome.is_executed());
        assert_eq!(
            f.transport.lines(),
            vec![(
                "#lvp.crew".to_string(),
                "!admin Info: Visitor is not part of the crew.".to_string()
            )]
        );
    }

    #[test]
    fn test_updatecrew_reply_after_tick() {
        let mut f = fixture();
        let outcome = f.router.route("#lvp.crew", "Russell", "!updatecrew");
        assert!(matches!(outcome, RouteOutcome::Executed { lines: 0, deferred: 1 }));
        assert_eq!(f.router.poll_deferred(), 0);

        assert!(matches!(f.queue.poll(), PollStatus::Completed(_)));
        assert_eq!(f.router.poll_deferred(), 1);
        assert_eq!(f.router.pending_replies(), 0);

        let lines = f.transport.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, "#lvp.crew");
        assert!(lines[0].1.starts_with("\x033* Success: Crew updated."));
    }
}
