//! Scheduler: runs every case concurrently under one deadline and reports
//! them in ascending await-slot order.
//!
//! Each case runs in its own tokio task; its `JoinHandle` is the completion
//! signal. A timer task cancels the shared token when the deadline passes,
//! which is the only bound on a run's length. Reporting order has no effect
//! on execution: handles are sorted by required slot (cases without one
//! first, ties in load order) and awaited in that order, so output streams as
//! the earliest-sorted cases finish.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use comply_proto::BeaconApi;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::cancel::CancelHandle;
use crate::context::{DEFAULT_POLL_INTERVAL, ExecutionContext};
use crate::executor::{CaseError, CaseResult, TestCase, execute_case};
use crate::fixtures::CaseSpec;

/// Aggregate counts for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn record(&mut self, case: &TestCase) {
        if case.skipped {
            self.skipped += 1;
        } else if case.result.success {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    /// True when any executed case failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed, self.failed, self.skipped
        )
    }
}

/// Launches cases against one target.
pub struct Scheduler {
    client: Arc<dyn BeaconApi>,
    timeout: Duration,
    subset: String,
    poll_interval: Duration,
    cancel: CancelHandle,
}

impl Scheduler {
    pub fn new(client: Arc<dyn BeaconApi>, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            subset: "/".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel: CancelHandle::new(),
        }
    }

    /// Only routes starting with `subset` execute; the rest are skipped.
    pub fn with_subset(mut self, subset: impl Into<String>) -> Self {
        self.subset = subset.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Uses an externally owned handle, e.g. one fired by a signal handler.
    /// The deadline timer cancels the same handle.
    pub fn with_cancel_source(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs every case and hands each one to `on_report` once it is terminal,
    /// in report order.
    pub async fn run<F>(&self, specs: Vec<CaseSpec>, mut on_report: F) -> RunSummary
    where
        F: FnMut(&TestCase),
    {
        let deadline = Instant::now() + self.timeout;
        let ctx = ExecutionContext::new(Arc::clone(&self.client), self.cancel.token(), deadline)
            .with_poll_interval(self.poll_interval);

        info!(
            cases = specs.len(),
            timeout = ?self.timeout,
            subset = %self.subset,
            "Starting run"
        );

        let timer = {
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                warn!("Deadline reached, cancelling outstanding cases");
                cancel.cancel();
            })
        };

        let subset: Arc<str> = Arc::from(self.subset.as_str());
        let mut pending: Vec<(u64, CaseSpec, JoinHandle<TestCase>)> = specs
            .into_iter()
            .map(|spec| {
                let handle = tokio::spawn({
                    let spec = spec.clone();
                    let ctx = ctx.clone();
                    let subset = Arc::clone(&subset);
                    async move { execute_case(spec, ctx, &subset).await }
                });
                (spec.sort_key(), spec, handle)
            })
            .collect();
        pending.sort_by_key(|(slot, _, _)| *slot);

        let mut summary = RunSummary::default();
        for (_, spec, handle) in pending {
            let case = match handle.await {
                Ok(case) => case,
                Err(e) => {
                    warn!(route = %spec.route, error = %e, "Case task did not complete");
                    TestCase {
                        spec,
                        result: CaseResult::failed(CaseError::Aborted(e.to_string())),
                        skipped: false,
                    }
                }
            };
            summary.record(&case);
            on_report(&case);
        }

        timer.abort();
        info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "Run finished"
        );
        summary
    }
}
