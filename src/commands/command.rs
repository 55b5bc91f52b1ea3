//! # Commands
//!
//! A trigger, the access level it requires and the body that runs. Invoking a
//! command checks the caller's level first; the body never runs for a caller
//! below it.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Typed result with classification code; panics become handler failures
//! - 1.0.0: Initial release

use super::context::CommandContext;
use super::handler::{CommandBody, Deferred, Output, Reply};
use super::trigger::Trigger;
use crate::core::error::{CommandError, RegistrationError};
use crate::core::format::color_code;
use crate::core::level::AccessLevel;
use anyhow::Result;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Classification of a command's output, driving its decoration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputCode {
    #[default]
    Normal,
    Error,
    Info,
    Notice,
    Success,
    Usage,
}

impl OutputCode {
    /// Colored marker placed before every line of this classification
    pub const fn prefix(self) -> &'static str {
        match self {
            OutputCode::Normal => "",
            OutputCode::Error => concat!(color_code!("4"), "* Error: "),
            OutputCode::Info => concat!(color_code!("10"), "* Info: "),
            OutputCode::Notice => concat!(color_code!("7"), "* Notice: "),
            OutputCode::Success => concat!(color_code!("3"), "* Success: "),
            OutputCode::Usage => concat!(color_code!("10"), "* Usage: "),
        }
    }
}

/// A classification code together with the text it applies to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandResult {
    pub code: OutputCode,
    pub body: String,
}

impl CommandResult {
    pub fn new(code: OutputCode, body: impl Into<String>) -> Self {
        Self {
            code,
            body: body.into(),
        }
    }

    pub fn normal(body: impl Into<String>) -> Self {
        Self::new(OutputCode::Normal, body)
    }

    pub fn error(body: impl Into<String>) -> Self {
        Self::new(OutputCode::Error, body)
    }

    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Output of a successful invocation
#[derive(Debug)]
pub struct Invocation {
    pub result: CommandResult,
    /// Replies waiting on queued queries
    pub deferred: Vec<Deferred>,
}

#[derive(Clone)]
pub struct Command {
    trigger: Trigger,
    level: AccessLevel,
    body: Arc<dyn CommandBody>,
}

impl Command {
    /// Create a command from an inline body
    pub fn new<F>(trigger: Trigger, level: AccessLevel, body: F) -> Result<Self, RegistrationError>
    where
        F: Fn(&CommandContext, &mut Output) -> Result<Reply> + Send + Sync + 'static,
    {
        Self::with_body(trigger, level, Arc::new(body))
    }

    pub fn with_body(
        trigger: Trigger,
        level: AccessLevel,
        body: Arc<dyn CommandBody>,
    ) -> Result<Self, RegistrationError> {
        if level == AccessLevel::Unrecognized {
            return Err(RegistrationError::UnrestrictedLevel(trigger.to_string()));
        }
        Ok(Self {
            trigger,
            level,
            body,
        })
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn level(&self) -> AccessLevel {
        self.level
    }

    /// Run the body for a caller at `ctx.level`.
    ///
    /// The result body is the returned text (if any) followed by everything the
    /// body wrote, each trimmed, separated by a newline.
    pub fn invoke(&self, ctx: &CommandContext) -> Result<Invocation, CommandError> {
        if !ctx.level.satisfies(self.level) {
            return Err(CommandError::AccessDenied {
                required: self.level,
                actual: ctx.level,
            });
        }

        let mut out = Output::new();
        let reply = match panic::catch_unwind(AssertUnwindSafe(|| self.body.run(ctx, &mut out))) {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Err(CommandError::HandlerFailure(e)),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                return Err(CommandError::HandlerFailure(anyhow::anyhow!(
                    "handler for {} panicked: {}",
                    self.trigger,
                    message
                )));
            }
        };

        let (captured, deferred) = out.into_parts();
        let (code, returned) = match reply {
            Reply::Silent => (OutputCode::Normal, None),
            Reply::Code(code) => (code, None),
            Reply::Text(text) => (OutputCode::Normal, Some(text)),
        };

        let body = returned
            .as_deref()
            .into_iter()
            .chain(std::iter::once(captured.as_str()))
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Invocation {
            result: CommandResult { code, body },
            deferred,
        })
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("trigger", &self.trigger)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::output::OutputMode;
    use std::fmt::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(level: AccessLevel) -> CommandContext {
        CommandContext::new(OutputMode::RawProtocol, level, "#lvp", "Gunther", "!test", "")
    }

    fn trigger() -> Trigger {
        Trigger::parse("!test", '!').unwrap()
    }

    #[test]
    fn test_access_denied_never_runs_body() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let command = Command::new(trigger(), AccessLevel::Moderator, move |_, out| {
            counter.fetch_add(1, Ordering::SeqCst);
            out.line("should not appear");
            Ok(Reply::Silent)
        })
        .unwrap();

        let err = command.invoke(&ctx(AccessLevel::None)).unwrap_err();
        assert!(matches!(
            err,
            CommandError::AccessDenied {
                required: AccessLevel::Moderator,
                actual: AccessLevel::None
            }
        ));
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        assert!(command.invoke(&ctx(AccessLevel::Administrator)).is_ok());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_code_classifies_captured_output() {
        let command = Command::new(trigger(), AccessLevel::None, |_, out| {
            writeln!(out, "  Player not found.  ")?;
            Ok(OutputCode::Error.into())
        })
        .unwrap();

        let result = command.invoke(&ctx(AccessLevel::None)).unwrap().result;
        assert_eq!(result, CommandResult::new(OutputCode::Error, "Player not found."));
    }

    #[test]
    fn test_returned_text_precedes_captured() {
        let command = Command::new(trigger(), AccessLevel::None, |_, out| {
            out.line("captured");
            Ok(Reply::from(" returned "))
        })
        .unwrap();

        let result = command.invoke(&ctx(AccessLevel::None)).unwrap().result;
        assert_eq!(result.code, OutputCode::Normal);
        assert_eq!(result.body, "returned\ncaptured");
    }

    #[test]
    fn test_silent_with_no_output_is_empty() {
        let command = Command::new(trigger(), AccessLevel::None, |_, _| Ok(Reply::Silent)).unwrap();
        let result = command.invoke(&ctx(AccessLevel::None)).unwrap().result;
        assert!(result.is_empty());
        assert_eq!(result.code, OutputCode::Normal);
    }

    #[test]
    fn test_failure_and_panic_become_handler_failures() {
        let failing = Command::new(trigger(), AccessLevel::None, |_, _| {
            Err(anyhow::anyhow!("database unavailable"))
        })
        .unwrap();
        let err = failing.invoke(&ctx(AccessLevel::None)).unwrap_err();
        assert_eq!(err.to_string(), "database unavailable");

        let panicking =
            Command::new(trigger(), AccessLevel::None, |_, _| panic!("roster out of sync")).unwrap();
        let err = panicking.invoke(&ctx(AccessLevel::None)).unwrap_err();
        assert!(matches!(err, CommandError::HandlerFailure(_)));
        assert!(err.to_string().contains("roster out of sync"));
    }

    #[test]
    fn test_unrecognized_level_rejected() {
        let result = Command::new(trigger(), AccessLevel::Unrecognized, |_, _| Ok(Reply::Silent));
        assert!(matches!(result, Err(RegistrationError::UnrestrictedLevel(_))));
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(OutputCode::Normal.prefix(), "");
        assert_eq!(OutputCode::Error.prefix(), "\x034* Error: ");
        assert_eq!(OutputCode::Info.prefix(), "\x0310* Info: ");
        assert_eq!(OutputCode::Notice.prefix(), "\x037* Notice: ");
        assert_eq!(OutputCode::Success.prefix(), "\x033* Success: ");
        assert_eq!(OutputCode::Usage.prefix(), "\x0310* Usage: ");
    }

    #[test]
    fn test_prefixes_are_colored_markers() {
        use crate::core::format::{is_formatted, strip_formatting, COLOR};

        for (code, marker) in [
            (OutputCode::Error, "* Error: "),
            (OutputCode::Info, "* Info: "),
            (OutputCode::Notice, "* Notice: "),
            (OutputCode::Success, "* Success: "),
            (OutputCode::Usage, "* Usage: "),
        ] {
            assert!(code.prefix().starts_with(COLOR), "{code:?}");
            assert_eq!(strip_formatting(code.prefix()), marker);
        }
        assert!(!is_formatted(OutputCode::Normal.prefix()));
    }
}
