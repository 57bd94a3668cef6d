//! State shared read-only by every case in a run.

use std::sync::Arc;
use std::time::Duration;

use comply_proto::BeaconApi;
use tokio::time::Instant;

use crate::cancel::Cancellation;

/// Interval between readiness polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Everything a case needs from the run: the target client, the shared
/// cancellation token and the global deadline.
#[derive(Clone)]
pub struct ExecutionContext {
    pub client: Arc<dyn BeaconApi>,
    pub cancel: Cancellation,
    pub deadline: Instant,
    pub poll_interval: Duration,
}

impl ExecutionContext {
    pub fn new(client: Arc<dyn BeaconApi>, cancel: Cancellation, deadline: Instant) -> Self {
        Self {
            client,
            cancel,
            deadline,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time left before the global deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Why the run stopped: the deadline, or an outside cancellation while
    /// time was still left.
    pub fn stop_reason(&self) -> String {
        let remaining = self.remaining();
        if remaining.is_zero() {
            "deadline reached".to_string()
        } else {
            format!("run cancelled with {}ms left", remaining.as_millis())
        }
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("deadline", &self.deadline)
            .field("poll_interval", &self.poll_interval)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
