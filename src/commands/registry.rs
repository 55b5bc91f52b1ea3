//! Trigger registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Pattern triggers alongside literal ones
//! - 1.0.0: Initial implementation for handler dispatch

use std::collections::HashMap;
use std::sync::Arc;

use super::command::Command;
use super::trigger::Trigger;

/// Registry mapping triggers to commands
///
/// Literal triggers are looked up first; pattern triggers are tried in
/// registration order and the first match wins. Registering a command whose
/// trigger is already in use replaces the old command.
///
/// # Example
///
/// ```ignore
/// let mut registry = TriggerRegistry::new();
/// registry.register(Command::new(Trigger::parse("!ping", '!')?, AccessLevel::None, ping)?);
///
/// if let Some(command) = registry.resolve("!ping") {
///     command.invoke(&ctx)?;
/// }
/// ```
#[derive(Clone, Default)]
pub struct TriggerRegistry {
    literals: HashMap<String, Arc<Command>>,
    patterns: Vec<Arc<Command>>,
}

impl TriggerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its trigger, replacing any command already there
    pub fn register(&mut self, command: Command) {
        self.unregister(command.trigger());
        let command = Arc::new(command);
        match command.trigger() {
            Trigger::Literal(text) => {
                self.literals.insert(text.clone(), command);
            }
            Trigger::Pattern { .. } => self.patterns.push(command),
        }
    }

    /// Remove the command registered under `trigger`. Returns whether one was removed.
    pub fn unregister(&mut self, trigger: &Trigger) -> bool {
        match trigger {
            Trigger::Literal(text) => self.literals.remove(text).is_some(),
            Trigger::Pattern { .. } => {
                let before = self.patterns.len();
                self.patterns.retain(|c| c.trigger() != trigger);
                self.patterns.len() != before
            }
        }
    }

    /// Find the command for a trigger text
    pub fn resolve(&self, trigger_text: &str) -> Option<Arc<Command>> {
        if let Some(command) = self.literals.get(trigger_text) {
            return Some(Arc::clone(command));
        }
        self.patterns
            .iter()
            .find(|c| c.trigger().matches(trigger_text))
            .cloned()
    }

    pub fn contains(&self, trigger: &Trigger) -> bool {
        match trigger {
            Trigger::Literal(text) => self.literals.contains_key(text),
            Trigger::Pattern { .. } => self.patterns.iter().any(|c| c.trigger() == trigger),
        }
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.literals.len() + self.patterns.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.patterns.is_empty()
    }

    /// Registered triggers, literals first
    pub fn triggers(&self) -> impl Iterator<Item = &Trigger> {
        self.literals
            .values()
            .chain(self.patterns.iter())
            .map(|c| c.trigger())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::CommandContext;
    use crate::commands::handler::Reply;
    use crate::commands::output::OutputMode;
    use crate::core::level::AccessLevel;

    fn command(trigger: &str, reply: &'static str) -> Command {
        Command::new(
            Trigger::parse(trigger, '!').unwrap(),
            AccessLevel::None,
            move |_, _| Ok(Reply::from(reply)),
        )
        .unwrap()
    }

    fn run(registry: &TriggerRegistry, trigger: &str) -> Option<String> {
        let ctx = CommandContext::new(OutputMode::RawProtocol, AccessLevel::None, "#lvp", "Gunther", trigger, "");
        registry
            .resolve(trigger)
            .map(|c| c.invoke(&ctx).unwrap().result.body)
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = TriggerRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_register_literal() {
        let mut registry = TriggerRegistry::new();
        registry.register(command("!ping", "pong"));

        assert_eq!(registry.len(), 1);
        assert_eq!(run(&registry, "!ping").as_deref(), Some("pong"));
        assert!(registry.resolve("!pong").is_none());
        assert!(registry.resolve("!PING").is_none());
    }

    #[test]
    fn test_literal_wins_over_pattern() {
        let mut registry = TriggerRegistry::new();
        registry.register(command("/^!p.*$/", "pattern"));
        registry.register(command("!ping", "literal"));

        assert_eq!(run(&registry, "!ping").as_deref(), Some("literal"));
        assert_eq!(run(&registry, "!players").as_deref(), Some("pattern"));
    }

    #[test]
    fn test_first_registered_pattern_wins() {
        let mut registry = TriggerRegistry::new();
        registry.register(command("/^!temp/", "first"));
        registry.register(command("/^!tempmod$/", "second"));

        assert_eq!(run(&registry, "!tempmod").as_deref(), Some("first"));
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut registry = TriggerRegistry::new();
        registry.register(command("!ping", "old"));
        registry.register(command("!ping", "new"));
        assert_eq!(registry.len(), 1);
        assert_eq!(run(&registry, "!ping").as_deref(), Some("new"));

        registry.register(command("/^!a/", "old pattern"));
        registry.register(command("/^!ab/", "other"));
        registry.register(command("/^!a/", "new pattern"));
        assert_eq!(registry.len(), 3);
        // The replaced pattern moves behind the ones registered before it
        assert_eq!(run(&registry, "!abc").as_deref(), Some("other"));
        assert_eq!(run(&registry, "!ax").as_deref(), Some("new pattern"));
    }

    #[test]
    fn test_unregister_by_trigger() {
        let mut registry = TriggerRegistry::new();
        registry.register(command("!ping", "pong"));
        registry.register(command("/^!p/", "pattern"));

        assert!(registry.unregister(&Trigger::parse("!ping", '!').unwrap()));
        assert!(!registry.unregister(&Trigger::parse("!ping", '!').unwrap()));
        assert_eq!(run(&registry, "!ping").as_deref(), Some("pattern"));

        assert!(registry.unregister(&Trigger::parse("/^!p/", '!').unwrap()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_default() {
        let registry = TriggerRegistry::default();
        assert!(registry.is_empty());
    }
}
