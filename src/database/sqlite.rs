//! # SQLite Store
//!
//! [`DataStore`] backed by a SQLite database. Each connection generation owns a
//! worker thread holding the `sqlite` connection, so submitting a query,
//! checking for its completion, pinging and reconnecting never block the
//! caller. A ping is answered by the worker in the background and collected by
//! the next call to [`DataStore::ping`].
//!
//! - **Version**: 1.3.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.3.0: Ping and reconnect no longer wait on the worker thread
//! - 1.2.0: Ping answers from the request channel while a query is running
//! - 1.1.0: Reconnect spawns a fresh worker generation
//! - 1.0.0: Initial release

use super::store::{DataStore, QueryOutput, Row};
use crate::core::error::StoreError;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

/// An unanswered ping older than this counts as a failed health check
const PING_TIMEOUT: Duration = Duration::from_secs(5);

type ExecuteReply = oneshot::Sender<Result<QueryOutput, StoreError>>;
type PingReply = oneshot::Sender<Result<(), StoreError>>;

enum Request {
    Execute { sql: String, reply: ExecuteReply },
    Ping { reply: PingReply },
}

/// A ping handed to the worker, awaiting its answer
struct PendingPing {
    reply: oneshot::Receiver<Result<(), StoreError>>,
    sent_at: Instant,
}

/// Dropping the worker closes its request channel, which ends the thread once
/// any running query finishes. Requests sent while the connection is still
/// opening wait in the channel; if opening fails the thread exits and the
/// channel reports closed.
struct Worker {
    requests: mpsc::UnboundedSender<Request>,
    ready: std_mpsc::Receiver<Result<(), StoreError>>,
    _thread: JoinHandle<()>,
}

impl Worker {
    fn spawn(path: &str, generation: u64) -> Result<Self, StoreError> {
        let (requests, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready) = std_mpsc::channel();
        let owned_path = path.to_string();

        let thread = std::thread::Builder::new()
            .name(format!("sqlite-{generation}"))
            .spawn(move || run_worker(owned_path, rx, ready_tx))
            .map_err(|e| StoreError::Other(format!("failed to spawn sqlite worker: {e}")))?;

        Ok(Self {
            requests,
            ready,
            _thread: thread,
        })
    }

    /// Block until the connection is open. Only used before the event loop
    /// starts.
    fn wait_ready(self) -> Result<Self, StoreError> {
        match self.ready.recv() {
            Ok(Ok(())) => Ok(self),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(StoreError::Disconnected),
        }
    }

    /// Open failure reported by the thread, if it has reported one yet
    fn open_error(&self) -> Option<StoreError> {
        match self.ready.try_recv() {
            Ok(Err(e)) => Some(e),
            _ => None,
        }
    }

    fn is_alive(&self) -> bool {
        !self.requests.is_closed()
    }
}

fn run_worker(
    path: String,
    mut requests: mpsc::UnboundedReceiver<Request>,
    ready: std_mpsc::Sender<Result<(), StoreError>>,
) {
    let connection = match sqlite::open(&path) {
        Ok(connection) => connection,
        Err(e) => {
            let _ = ready.send(Err(StoreError::Sqlite(e)));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }

    while let Some(request) = requests.blocking_recv() {
        match request {
            Request::Execute { sql, reply } => {
                let result = execute(&connection, &sql);
                if let Err(e) = &result {
                    debug!("Query failed on worker: {e}");
                }
                let _ = reply.send(result);
            }
            Request::Ping { reply } => {
                let result = connection.execute("SELECT 1").map_err(StoreError::from);
                let _ = reply.send(result);
            }
        }
    }
    debug!("SQLite worker for {path} stopped");
}

fn execute(connection: &sqlite::Connection, sql: &str) -> Result<QueryOutput, StoreError> {
    let mut statement = connection.prepare(sql)?;
    let columns: Vec<String> = statement.column_names().to_vec();

    let mut rows = Vec::new();
    while let sqlite::State::Row = statement.next()? {
        let mut values = HashMap::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            values.insert(column.clone(), statement.read::<Option<String>, _>(index)?);
        }
        rows.push(Row::new(values));
    }

    let affected_rows = if columns.is_empty() {
        connection.change_count()
    } else {
        0
    };

    Ok(QueryOutput {
        columns,
        rows,
        affected_rows,
    })
}

/// SQLite-backed data store with one query outstanding at a time
pub struct SqliteStore {
    path: String,
    generation: u64,
    worker: Option<Worker>,
    in_flight: Option<oneshot::Receiver<Result<QueryOutput, StoreError>>>,
    ping: Option<PendingPing>,
}

impl SqliteStore {
    /// Open the database at `path` (`:memory:` for a private in-memory
    /// database). Waits for the connection to open, so open errors are
    /// reported here.
    pub fn connect(path: &str) -> Result<Self, StoreError> {
        let worker = Worker::spawn(path, 1)?.wait_ready()?;
        info!("🗄️ Connected to SQLite database at {path}");
        Ok(Self {
            path: path.to_string(),
            generation: 1,
            worker: Some(worker),
            in_flight: None,
            ping: None,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Incremented on every reconnect
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a ping is waiting for the worker's answer
    pub fn ping_pending(&self) -> bool {
        self.ping.is_some()
    }

    fn worker(&self) -> Result<&Worker, StoreError> {
        match &self.worker {
            Some(worker) if worker.is_alive() => Ok(worker),
            Some(worker) => Err(worker.open_error().unwrap_or(StoreError::Disconnected)),
            None => Err(StoreError::Disconnected),
        }
    }

    /// Outcome of the pending ping. `None` while it is still within its
    /// deadline.
    fn collect_ping(&mut self) -> Option<Result<(), StoreError>> {
        let pending = self.ping.as_mut()?;
        let result = match pending.reply.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => {
                if pending.sent_at.elapsed() < PING_TIMEOUT {
                    return None;
                }
                warn!("SQLite ping unanswered after {PING_TIMEOUT:?}");
                Err(StoreError::Other("ping timed out".to_string()))
            }
            Err(oneshot::error::TryRecvError::Closed) => Err(StoreError::Disconnected),
        };
        self.ping = None;
        Some(result)
    }
}

impl DataStore for SqliteStore {
    fn submit(&mut self, sql: &str) -> Result<(), StoreError> {
        if self.in_flight.is_some() {
            return Err(StoreError::Busy);
        }
        let (reply, rx) = oneshot::channel();
        self.worker()?
            .requests
            .send(Request::Execute {
                sql: sql.to_string(),
                reply,
            })
            .map_err(|_| StoreError::Disconnected)?;
        self.in_flight = Some(rx);
        Ok(())
    }

    fn reap(&mut self) -> Option<Result<QueryOutput, StoreError>> {
        let rx = self.in_flight.as_mut()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(StoreError::Disconnected),
        };
        self.in_flight = None;
        Some(result)
    }

    /// Reports the answer to the previous ping and hands the worker a new
    /// one. A ping still inside its deadline counts as healthy.
    fn ping(&mut self) -> Result<(), StoreError> {
        self.worker()?;
        match self.collect_ping() {
            Some(Err(e)) => return Err(e),
            Some(Ok(())) => {}
            None if self.ping.is_some() => return Ok(()),
            None => {}
        }
        if self.in_flight.is_some() {
            // The worker is busy with the query; a live channel is all we can tell
            return Ok(());
        }

        let (reply, rx) = oneshot::channel();
        self.worker()?
            .requests
            .send(Request::Ping { reply })
            .map_err(|_| StoreError::Disconnected)?;
        self.ping = Some(PendingPing {
            reply: rx,
            sent_at: Instant::now(),
        });
        Ok(())
    }

    /// Starts a new worker generation without waiting for it to open the
    /// database. An open failure shows up on the next ping.
    fn reconnect(&mut self) -> Result<(), StoreError> {
        self.in_flight = None;
        self.ping = None;
        self.worker = None;
        self.generation += 1;

        match Worker::spawn(&self.path, self.generation) {
            Ok(worker) => {
                info!(
                    "🗄️ Reconnecting to SQLite database at {} (generation {})",
                    self.path, self.generation
                );
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                error!("❌ Failed to reconnect to SQLite database at {}: {e}", self.path);
                Err(e)
            }
        }
    }
}
