//! Command handler bodies and their output writer
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Explicit output writer replaces captured stdout
//! - 1.1.0: Deferred replies for queued queries
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use std::fmt;

use super::command::{CommandResult, OutputCode};
use super::context::CommandContext;
use crate::database::{QueryHandle, QueryResult};

/// What a handler body returns besides the text it wrote
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Reply {
    /// Normal classification; the body is whatever was written
    #[default]
    Silent,
    /// Classify the written output
    Code(OutputCode),
    /// Normal-classified text, placed before anything written
    Text(String),
}

impl From<OutputCode> for Reply {
    fn from(code: OutputCode) -> Self {
        Reply::Code(code)
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

/// Trait for command handler bodies
///
/// Closures `Fn(&CommandContext, &mut Output) -> Result<Reply>` implement it,
/// so small commands can be registered inline while larger ones get a struct
/// holding their shared services.
///
/// # Example
///
/// ```ignore
/// pub struct PingHandler;
///
/// impl CommandBody for PingHandler {
///     fn run(&self, ctx: &CommandContext, out: &mut Output) -> Result<Reply> {
///         writeln!(out, "Pong, {}!", ctx.nickname)?;
///         Ok(Reply::Silent)
///     }
/// }
/// ```
pub trait CommandBody: Send + Sync {
    fn run(&self, ctx: &CommandContext, out: &mut Output) -> Result<Reply>;
}

impl<F> CommandBody for F
where
    F: Fn(&CommandContext, &mut Output) -> Result<Reply> + Send + Sync,
{
    fn run(&self, ctx: &CommandContext, out: &mut Output) -> Result<Reply> {
        self(ctx, out)
    }
}

type Continuation = Box<dyn FnOnce(QueryResult) -> CommandResult + Send>;

/// A reply produced once a queued query settles
pub struct Deferred {
    handle: QueryHandle,
    continuation: Continuation,
}

impl Deferred {
    pub fn new<F>(handle: QueryHandle, continuation: F) -> Self
    where
        F: FnOnce(QueryResult) -> CommandResult + Send + 'static,
    {
        Self {
            handle,
            continuation: Box::new(continuation),
        }
    }

    /// The reply if the query settled, otherwise `self` back for a later check
    pub fn try_complete(mut self) -> std::result::Result<CommandResult, Self> {
        match self.handle.try_result() {
            Some(result) => Ok((self.continuation)(result)),
            None => Err(self),
        }
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("query", &self.handle.id())
            .finish_non_exhaustive()
    }
}

/// Writer handed to a handler body. Everything written is buffered and
/// becomes part of the command's result.
#[derive(Debug, Default)]
pub struct Output {
    buffer: String,
    deferred: Vec<Deferred>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        self.buffer.push_str(text.as_ref());
        self.buffer.push('\n');
    }

    /// Reply later, when the query behind `handle` settles
    pub fn defer<F>(&mut self, handle: QueryHandle, continuation: F)
    where
        F: FnOnce(QueryResult) -> CommandResult + Send + 'static,
    {
        self.deferred.push(Deferred::new(handle, continuation));
    }

    pub fn captured(&self) -> &str {
        &self.buffer
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Deferred>) {
        (self.buffer, self.deferred)
    }
}

impl fmt::Write for Output {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.push_str(s);
        Ok(())
    }
}
