//! # Async Query Queue
//!
//! Strict FIFO queue of data-store queries with a single in-flight slot,
//! advanced by [`QueryQueue::poll`] from the host's tick loop. Handlers enqueue
//! through a cloneable [`QueryQueueHandle`] and get a [`QueryHandle`] back
//! without waiting.
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 2.1.0: Shared gauge for queue depth and in-flight age
//! - 2.0.0: Queue owns its store; enqueue through a handle
//! - 1.0.0: Initial release

use super::query::{AsyncQuery, QueryHandle};
use super::store::DataStore;
use crate::core::error::{QueryError, StoreError};
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// What a single [`QueryQueue::poll`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// Nothing queued and nothing in flight
    Idle,
    /// A query is in flight and has not completed yet
    Waiting,
    /// The in-flight query succeeded and its handle was resolved
    Completed(Uuid),
    /// The in-flight query failed and its handle was rejected
    Failed(Uuid),
    /// The head query could not be submitted and its handle was rejected
    SubmissionFailed(Uuid),
}

/// Result of a heartbeat connection check
#[derive(Debug)]
pub enum ConnectionStatus {
    Healthy,
    Reconnected,
    ReconnectFailed(StoreError),
}

/// Counters shared between the queue and its handles
#[derive(Debug, Default)]
pub struct QueueGauge {
    pending: AtomicUsize,
    /// Start of the in-flight query in epoch milliseconds, 0 when idle
    in_flight_since: AtomicI64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time view of a queue for status commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub pending: usize,
    pub in_flight_since: Option<DateTime<Utc>>,
    pub completed: u64,
    pub failed: u64,
}

impl QueueGauge {
    pub fn snapshot(&self) -> QueueSnapshot {
        let since = self.in_flight_since.load(Ordering::Relaxed);
        QueueSnapshot {
            pending: self.pending.load(Ordering::Relaxed),
            in_flight_since: if since == 0 {
                None
            } else {
                Utc.timestamp_millis_opt(since).single()
            },
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn started(&self, at: DateTime<Utc>) {
        self.pending.fetch_sub(1, Ordering::Relaxed);
        self.in_flight_since
            .store(at.timestamp_millis().max(1), Ordering::Relaxed);
    }

    fn finished(&self, success: bool) {
        self.in_flight_since.store(0, Ordering::Relaxed);
        if success {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Enqueue side of a [`QueryQueue`]
#[derive(Clone)]
pub struct QueryQueueHandle {
    intake: mpsc::UnboundedSender<AsyncQuery>,
    gauge: Arc<QueueGauge>,
}

impl QueryQueueHandle {
    /// Append a query to the tail of the queue. Never blocks.
    pub fn enqueue(&self, sql: impl Into<String>) -> QueryHandle {
        let (query, handle) = AsyncQuery::new(sql);
        debug!("[{}] Enqueued query: {}", query.id(), query.sql());

        self.gauge.pending.fetch_add(1, Ordering::Relaxed);
        if let Err(mpsc::error::SendError(mut query)) = self.intake.send(query) {
            self.gauge.pending.fetch_sub(1, Ordering::Relaxed);
            warn!("[{}] Query queue is closed, rejecting query", query.id());
            query.fail(QueryError::QueueClosed);
        }
        handle
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.gauge.snapshot()
    }
}

/// Single-flight FIFO query queue. Owns its [`DataStore`].
pub struct QueryQueue<S: DataStore> {
    store: S,
    intake: mpsc::UnboundedReceiver<AsyncQuery>,
    pending: VecDeque<AsyncQuery>,
    in_flight: Option<AsyncQuery>,
    gauge: Arc<QueueGauge>,
}

impl<S: DataStore> QueryQueue<S> {
    pub fn new(store: S) -> (Self, QueryQueueHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let gauge = Arc::new(QueueGauge::default());
        let queue = Self {
            store,
            intake: rx,
            pending: VecDeque::new(),
            in_flight: None,
            gauge: Arc::clone(&gauge),
        };
        (queue, QueryQueueHandle { intake: tx, gauge })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.gauge.pending.load(Ordering::Relaxed) == 0
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    fn drain_intake(&mut self) {
        while let Ok(query) = self.intake.try_recv() {
            self.pending.push_back(query);
        }
    }

    /// Advance the queue by one non-blocking step.
    ///
    /// With the slot free, the head query is submitted and checked for
    /// completion in the same step. A submission failure rejects that query
    /// and stops; the next query starts on the following poll.
    pub fn poll(&mut self) -> PollStatus {
        self.drain_intake();

        if self.in_flight.is_none() {
            let Some(mut query) = self.pending.pop_front() else {
                return PollStatus::Idle;
            };

            query.start();
            if let Some(started_at) = query.started_at() {
                self.gauge.started(started_at);
            }
            debug!("[{}] Submitting query: {}", query.id(), query.sql());

            if let Err(e) = self.store.submit(query.sql()) {
                warn!("[{}] ❌ Query submission failed: {e}", query.id());
                let id = query.id();
                query.fail(QueryError::Submission(e));
                self.gauge.finished(false);
                return PollStatus::SubmissionFailed(id);
            }
            self.in_flight = Some(query);
        }

        self.check_in_flight()
    }

    fn check_in_flight(&mut self) -> PollStatus {
        let Some(result) = self.store.reap() else {
            return PollStatus::Waiting;
        };
        let Some(mut query) = self.in_flight.take() else {
            error!("Data store reported a completion with no query in flight");
            return PollStatus::Idle;
        };
        let id = query.id();

        match result {
            Ok(output) => {
                debug!(
                    "[{id}] ✅ Query completed with {} rows ({} affected)",
                    output.rows.len(),
                    output.affected_rows
                );
                query.succeed(output);
                self.gauge.finished(true);
                PollStatus::Completed(id)
            }
            Err(e) => {
                warn!("[{id}] ❌ Query failed: {e}");
                query.fail(QueryError::Execution(e));
                self.gauge.finished(false);
                PollStatus::Failed(id)
            }
        }
    }

    /// Ping the store and reconnect when it does not answer. A query in flight
    /// at that moment is rejected with [`QueryError::ConnectionReset`].
    pub fn check_connection(&mut self) -> ConnectionStatus {
        let Err(e) = self.store.ping() else {
            return ConnectionStatus::Healthy;
        };
        warn!("⚠️ Data store ping failed: {e}, reconnecting");

        if let Some(mut query) = self.in_flight.take() {
            warn!("[{}] Rejecting in-flight query after connection loss", query.id());
            query.fail(QueryError::ConnectionReset);
            self.gauge.finished(false);
        }

        match self.store.reconnect() {
            Ok(()) => {
                info!("🔌 Data store connection re-established");
                ConnectionStatus::Reconnected
            }
            Err(e) => ConnectionStatus::ReconnectFailed(e),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::store::{QueryOutput, Row};
    use std::collections::HashMap;

    /// Scripted store: each query completes after `delay` reap calls with either
    /// a single-row result echoing the SQL or a scripted failure. Overlapping
    /// submits are accepted and completed in order, so `max_concurrent` is the
    /// highest number of queries the caller ever had outstanding.
    #[derive(Default)]
    pub(crate) struct StubStore {
        pub(crate) delay: usize,
        pub(crate) fail_sql: Vec<String>,
        pub(crate) reject_submit: Vec<String>,
        pub(crate) ping_fails: bool,
        pub(crate) reconnect_fails: bool,
        pub(crate) offline: bool,
        pub(crate) submitted: Vec<String>,
        pub(crate) reconnects: usize,
        pub(crate) max_concurrent: usize,
        pub(crate) outstanding: VecDeque<(String, usize)>,
    }

    impl DataStore for StubStore {
        fn submit(&mut self, sql: &str) -> Result<(), StoreError> {
            if self.offline || self.reject_submit.iter().any(|s| s == sql) {
                return Err(StoreError::Disconnected);
            }
            self.submitted.push(sql.to_string());
            self.outstanding.push_back((sql.to_string(), self.delay));
            self.max_concurrent = self.max_concurrent.max(self.outstanding.len());
            Ok(())
        }

        fn reap(&mut self) -> Option<Result<QueryOutput, StoreError>> {
            let (_, remaining) = self.outstanding.front_mut()?;
            if *remaining > 0 {
                *remaining -= 1;
                return None;
            }
            let (sql, _) = self.outstanding.pop_front()?;
            if self.fail_sql.contains(&sql) {
                return Some(Err(StoreError::Other(format!("failed: {sql}"))));
            }
            let mut values = HashMap::new();
            values.insert("sql".to_string(), Some(sql));
            Some(Ok(QueryOutput::from_rows(vec![Row::new(values)])))
        }

        fn ping(&mut self) -> Result<(), StoreError> {
            if self.ping_fails {
                Err(StoreError::Disconnected)
            } else {
                Ok(())
            }
        }

        fn reconnect(&mut self) -> Result<(), StoreError> {
            self.outstanding.clear();
            self.reconnects += 1;
            if self.reconnect_fails {
                self.offline = true;
                return Err(StoreError::Disconnected);
            }
            self.offline = false;
            self.ping_fails = false;
            Ok(())
        }
    }

    #[test]
    fn test_stub_measures_overlapping_submits() {
        let mut store = StubStore {
            delay: 1,
            ..Default::default()
        };
        store.submit("A").unwrap();
        store.submit("B").unwrap();
        assert_eq!(store.max_concurrent, 2);

        assert!(store.reap().is_none());
        assert_eq!(sql_of(&store.reap().unwrap().unwrap()), "A");
        assert_eq!(store.outstanding.len(), 1);
    }

    fn sql_of(result: &QueryOutput) -> String {
        result.rows[0].get("sql").unwrap_or_default().to_string()
    }

    #[test]
    fn test_poll_on_empty_queue_is_idle() {
        let (mut queue, _handle) = QueryQueue::new(StubStore::default());
        assert_eq!(queue.poll(), PollStatus::Idle);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_completes_in_enqueue_order() {
        let store = StubStore {
            delay: 2,
            ..Default::default()
        };
        let (mut queue, handle) = QueryQueue::new(store);
        let mut handles: Vec<Option<QueryHandle>> = ["A", "B", "C"]
            .iter()
            .map(|sql| Some(handle.enqueue(*sql)))
            .collect();

        let mut order = Vec::new();
        for _ in 0..20 {
            queue.poll();
            for (i, slot) in handles.iter_mut().enumerate() {
                let Some(h) = slot.as_mut() else { continue };
                if let Some(result) = h.try_result() {
                    order.push((i, sql_of(&result.unwrap())));
                    *slot = None;
                }
            }
        }

        assert_eq!(
            order,
            vec![(0, "A".to_string()), (1, "B".to_string()), (2, "C".to_string())]
        );
        assert_eq!(queue.store().submitted, vec!["A", "B", "C"]);
        assert_eq!(queue.store().max_concurrent, 1);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_immediate_completion_in_same_poll() {
        let (mut queue, handle) = QueryQueue::new(StubStore::default());
        let mut h = handle.enqueue("A");
        assert!(matches!(queue.poll(), PollStatus::Completed(_)));
        assert!(h.try_result().unwrap().is_ok());
    }

    #[test]
    fn test_failed_query_does_not_advance_next_in_same_poll() {
        let store = StubStore {
            fail_sql: vec!["A".to_string()],
            ..Default::default()
        };
        let (mut queue, handle) = QueryQueue::new(store);
        let mut a = handle.enqueue("A");
        let mut b = handle.enqueue("B");

        assert!(matches!(queue.poll(), PollStatus::Failed(_)));
        assert!(matches!(a.try_result(), Some(Err(QueryError::Execution(_)))));
        assert!(b.try_result().is_none());
        assert_eq!(queue.store().submitted, vec!["A"]);
        assert_eq!(handle.snapshot().pending, 1);

        assert!(matches!(queue.poll(), PollStatus::Completed(_)));
        assert!(b.try_result().unwrap().is_ok());
    }

    #[test]
    fn test_submission_failure_rejects_and_stops() {
        let store = StubStore {
            reject_submit: vec!["A".to_string()],
            ..Default::default()
        };
        let (mut queue, handle) = QueryQueue::new(store);
        let mut a = handle.enqueue("A");
        let mut b = handle.enqueue("B");

        assert!(matches!(queue.poll(), PollStatus::SubmissionFailed(_)));
        assert!(matches!(a.try_result(), Some(Err(QueryError::Submission(_)))));
        assert!(b.try_result().is_none());
        assert!(!queue.has_in_flight());

        queue.poll();
        assert!(b.try_result().unwrap().is_ok());
    }

    #[test]
    fn test_connection_loss_rejects_in_flight() {
        let store = StubStore {
            delay: 10,
            ..Default::default()
        };
        let (mut queue, handle) = QueryQueue::new(store);
        let mut a = handle.enqueue("A");
        let mut b = handle.enqueue("B");

        assert_eq!(queue.poll(), PollStatus::Waiting);
        assert!(matches!(queue.check_connection(), ConnectionStatus::Healthy));

        queue.store.ping_fails = true;
        assert!(matches!(queue.check_connection(), ConnectionStatus::Reconnected));
        assert_eq!(queue.store().reconnects, 1);
        assert!(matches!(a.try_result(), Some(Err(QueryError::ConnectionReset))));
        assert!(b.try_result().is_none());

        queue.store.delay = 0;
        queue.poll();
        assert!(b.try_result().unwrap().is_ok());
    }

    #[test]
    fn test_failed_reconnect_rejects_queued_queries() {
        let store = StubStore {
            ping_fails: true,
            reconnect_fails: true,
            ..Default::default()
        };
        let (mut queue, handle) = QueryQueue::new(store);
        let mut a = handle.enqueue("A");
        let mut b = handle.enqueue("B");

        assert!(matches!(
            queue.check_connection(),
            ConnectionStatus::ReconnectFailed(StoreError::Disconnected)
        ));
        assert!(matches!(queue.poll(), PollStatus::SubmissionFailed(_)));
        assert!(matches!(
            a.try_result(),
            Some(Err(QueryError::Submission(StoreError::Disconnected)))
        ));
        assert!(b.try_result().is_none());

        queue.store.reconnect_fails = false;
        assert!(matches!(queue.check_connection(), ConnectionStatus::Reconnected));
        assert!(matches!(queue.poll(), PollStatus::Completed(_)));
        assert!(b.try_result().unwrap().is_ok());
        assert_eq!(queue.store().submitted, vec!["B".to_string()]);
    }

    #[test]
    fn test_gauge_tracks_depth_and_in_flight() {
        let store = StubStore {
            delay: 1,
            ..Default::default()
        };
        let (mut queue, handle) = QueryQueue::new(store);
        handle.enqueue("A");
        handle.enqueue("B");
        assert_eq!(handle.snapshot().pending, 2);

        queue.poll();
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.pending, 1);
        assert!(snapshot.in_flight_since.is_some());

        queue.poll();
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.completed, 1);
        assert!(snapshot.in_flight_since.is_none());
    }

    #[test]
    fn test_enqueue_after_queue_dropped_is_rejected() {
        let (queue, handle) = QueryQueue::new(StubStore::default());
        drop(queue);
        let mut h = handle.enqueue("A");
        assert!(matches!(h.try_result(), Some(Err(QueryError::QueueClosed))));
    }

    #[test]
    fn test_dropping_queue_abandons_pending() {
        let (mut queue, handle) = QueryQueue::new(StubStore {
            delay: 5,
            ..Default::default()
        });
        let mut a = handle.enqueue("A");
        queue.poll();
        drop(queue);
        assert!(matches!(a.try_result(), Some(Err(QueryError::Abandoned))));
    }
}
