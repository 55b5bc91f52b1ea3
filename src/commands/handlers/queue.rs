//! Query queue command handlers
//!
//! Handles: !queue
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0

use anyhow::Result;
use chrono::Utc;

use crate::commands::command::OutputCode;
use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandBody, Output, Reply};
use crate::database::{QueryQueueHandle, QueueSnapshot};

/// Handler for `!queue`: reports the depth and progress of the query queue
pub struct QueueStatusHandler {
    pub queries: QueryQueueHandle,
}

impl CommandBody for QueueStatusHandler {
    fn run(&self, _ctx: &CommandContext, out: &mut Output) -> Result<Reply> {
        out.line(describe(&self.queries.snapshot()));
        Ok(OutputCode::Info.into())
    }
}

fn describe(snapshot: &QueueSnapshot) -> String {
    let in_flight = match snapshot.in_flight_since {
        Some(since) => format!(
            "one query in flight for {}ms",
            (Utc::now() - since).num_milliseconds().max(0)
        ),
        None => "nothing in flight".to_string(),
    };
    format!(
        "{} pending, {in_flight} ({} completed, {} failed).",
        snapshot.pending, snapshot.completed, snapshot.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_describe_idle() {
        let snapshot = QueueSnapshot {
            pending: 0,
            in_flight_since: None,
            completed: 4,
            failed: 1,
        };
        assert_eq!(
            describe(&snapshot),
            "0 pending, nothing in flight (4 completed, 1 failed)."
        );
    }

    #[test]
    fn test_describe_in_flight() {
        let snapshot = QueueSnapshot {
            pending: 2,
            in_flight_since: Some(Utc::now() - Duration::seconds(3)),
            completed: 0,
            failed: 0,
        };
        let text = describe(&snapshot);
        assert!(text.starts_with("2 pending, one query in flight for "));
        assert!(text.ends_with("ms (0 completed, 0 failed)."));
    }
}
