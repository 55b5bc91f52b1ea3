//! Periodic data-store health check
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.5.0
//!
//! ## Changelog
//! - 1.0.0: Initial release

use super::queue::{ConnectionStatus, QueryQueue};
use super::store::DataStore;
use log::{debug, error};
use std::time::{Duration, Instant};

/// Pings the queue's store once per interval and reconnects on failure
#[derive(Debug)]
pub struct Heartbeat {
    interval: Duration,
    last: Option<Instant>,
}

impl Heartbeat {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Run the check when due. Returns `None` when it was not yet time.
    pub fn tick<S: DataStore>(
        &mut self,
        now: Instant,
        queue: &mut QueryQueue<S>,
    ) -> Option<ConnectionStatus> {
        if !self.is_due(now) {
            return None;
        }
        self.last = Some(now);

        let status = queue.check_connection();
        match &status {
            ConnectionStatus::Healthy => debug!("💓 Data store heartbeat ok"),
            ConnectionStatus::Reconnected => {}
            ConnectionStatus::ReconnectFailed(e) => {
                error!("❌ Data store reconnect failed, retrying next heartbeat: {e}")
            }
        }
        Some(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::QueryError;
    use crate::database::queue::tests::StubStore;

    #[test]
    fn test_runs_once_per_interval() {
        let (mut queue, _handle) = QueryQueue::new(StubStore::default());
        let mut heartbeat = Heartbeat::new(Duration::from_secs(30));
        let start = Instant::now();

        assert!(matches!(
            heartbeat.tick(start, &mut queue),
            Some(ConnectionStatus::Healthy)
        ));
        assert!(heartbeat.tick(start + Duration::from_secs(10), &mut queue).is_none());
        assert!(heartbeat.tick(start + Duration::from_secs(30), &mut queue).is_some());
    }

    #[test]
    fn test_failed_ping_resets_in_flight_query() {
        let (mut queue, handle) = QueryQueue::new(StubStore {
            delay: 100,
            ping_fails: true,
            ..Default::default()
        });
        let mut pending = handle.enqueue("SELECT * FROM users");
        queue.poll();

        let mut heartbeat = Heartbeat::new(Duration::from_secs(30));
        assert!(matches!(
            heartbeat.tick(Instant::now(), &mut queue),
            Some(ConnectionStatus::Reconnected)
        ));
        assert!(matches!(
            pending.try_result(),
            Some(Err(QueryError::ConnectionReset))
        ));
        assert_eq!(queue.store().reconnects, 1);
    }
}
