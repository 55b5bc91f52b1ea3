//! # Async Queries
//!
//! A queued query and the one-shot handle its enqueuer waits on.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.1.0: Handle implements `Future` in addition to polling
//! - 1.0.0: Initial release

use super::store::QueryOutput;
use crate::core::error::QueryError;
use chrono::{DateTime, Utc};
use log::debug;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use uuid::Uuid;

pub type QueryResult = Result<QueryOutput, QueryError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

impl QueryState {
    pub fn is_terminal(self) -> bool {
        matches!(self, QueryState::Succeeded | QueryState::Failed)
    }
}

/// A query owned by the queue from enqueue until it settles
#[derive(Debug)]
pub struct AsyncQuery {
    id: Uuid,
    sql: String,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    state: QueryState,
    completion: Option<oneshot::Sender<QueryResult>>,
}

impl AsyncQuery {
    pub fn new(sql: impl Into<String>) -> (Self, QueryHandle) {
        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        let query = Self {
            id,
            sql: sql.into(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            state: QueryState::Pending,
            completion: Some(tx),
        };
        (query, QueryHandle { id, rx })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub(crate) fn start(&mut self) {
        self.state = QueryState::InFlight;
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn succeed(&mut self, output: QueryOutput) {
        self.settle(QueryState::Succeeded, Ok(output));
    }

    pub(crate) fn fail(&mut self, error: QueryError) {
        self.settle(QueryState::Failed, Err(error));
    }

    fn settle(&mut self, state: QueryState, result: QueryResult) {
        if self.state.is_terminal() {
            return;
        }
        self.state = state;
        self.finished_at = Some(Utc::now());

        if let Some(completion) = self.completion.take() {
            if completion.send(result).is_err() {
                debug!("[{}] Query settled after its handle was dropped", self.id);
            }
        }
    }
}

/// Resolves or rejects exactly once with the query's outcome.
///
/// Dropping the queue before the query settles rejects it with
/// [`QueryError::Abandoned`].
#[derive(Debug)]
pub struct QueryHandle {
    id: Uuid,
    rx: oneshot::Receiver<QueryResult>,
}

impl QueryHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Non-blocking check; `None` while the query has not settled.
    ///
    /// The outcome is delivered once; later calls report [`QueryError::Abandoned`].
    pub fn try_result(&mut self) -> Option<QueryResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(QueryError::Abandoned)),
        }
    }
}

impl Future for QueryHandle {
    type Output = QueryResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(QueryError::Abandoned)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_timestamps() {
        let (mut query, mut handle) = AsyncQuery::new("SELECT 1");
        assert_eq!(query.state(), QueryState::Pending);
        assert!(query.started_at().is_none());
        assert!(handle.try_result().is_none());

        query.start();
        assert_eq!(query.state(), QueryState::InFlight);
        assert!(query.started_at().is_some());

        query.succeed(QueryOutput::default());
        assert_eq!(query.state(), QueryState::Succeeded);
        assert!(query.finished_at().is_some());
        assert!(handle.try_result().unwrap().is_ok());
    }

    #[test]
    fn test_settles_once() {
        let (mut query, mut handle) = AsyncQuery::new("SELECT 1");
        query.start();
        query.fail(QueryError::ConnectionReset);
        query.succeed(QueryOutput::default());

        assert_eq!(query.state(), QueryState::Failed);
        assert!(matches!(
            handle.try_result(),
            Some(Err(QueryError::ConnectionReset))
        ));
    }

    #[test]
    fn test_dropped_query_is_abandoned() {
        let (query, mut handle) = AsyncQuery::new("SELECT 1");
        drop(query);
        assert!(matches!(handle.try_result(), Some(Err(QueryError::Abandoned))));
    }

    #[tokio::test]
    async fn test_handle_is_awaitable() {
        let (mut query, handle) = AsyncQuery::new("SELECT 1");
        query.start();
        query.succeed(QueryOutput {
            affected_rows: 3,
            ..Default::default()
        });
        let output = handle.await.unwrap();
        assert_eq!(output.affected_rows, 3);
    }
}
