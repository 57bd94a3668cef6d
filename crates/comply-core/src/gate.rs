//! Readiness gate: holds a case back until the target is healthy and, when
//! asked, synchronized past a slot.
//!
//! Both predicates are polled on `ctx.poll_interval`. Every poll and every
//! sleep is raced against the run's cancellation, and cancellation always
//! produces an error naming the route the target was expected to serve.

use comply_proto::models::SyncingStatus;
use comply_proto::{ApiResponse, Operation};
use tracing::{debug, warn};

use crate::context::ExecutionContext;

pub const HEALTH_ROUTE: &str = "/eth/v1/node/health";
pub const SYNCING_ROUTE: &str = "/eth/v1/node/syncing";

/// Gate failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// A precondition did not hold before cancellation, or the status route
    /// itself failed.
    #[error(
        "Target not compliant: {reason}. Does the target implement {route}? \
         See https://ethereum.github.io/beacon-APIs/ for the required behavior."
    )]
    TargetUnavailable { route: &'static str, reason: String },

    /// The sync status carried a field that is not an unsigned integer.
    #[error("Target reported an unparsable {field} '{value}' on {SYNCING_ROUTE}")]
    InvalidSyncStatus { field: &'static str, value: String },
}

/// Sync position reported by the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress {
    pub head_slot: u64,
    pub sync_distance: u64,
}

impl SyncProgress {
    pub fn from_status(status: &SyncingStatus) -> Result<Self, GateError> {
        Ok(Self {
            head_slot: parse_slot("head_slot", &status.head_slot)?,
            sync_distance: parse_slot("sync_distance", &status.sync_distance)?,
        })
    }

    /// Latest slot the target has fully synchronized.
    pub fn current_slot(self) -> u64 {
        self.head_slot.saturating_sub(self.sync_distance)
    }
}

fn parse_slot(field: &'static str, value: &str) -> Result<u64, GateError> {
    value.trim().parse().map_err(|_| GateError::InvalidSyncStatus {
        field,
        value: value.to_string(),
    })
}

/// Waits until the health route answers 200 or 206.
///
/// Any other status and any transport failure is retried.
pub async fn await_healthy(ctx: &ExecutionContext) -> Result<(), GateError> {
    let mut attempts: u32 = 0;
    let mut last_outcome = "no response".to_string();

    loop {
        if ctx.is_cancelled() {
            warn!(attempts, last = %last_outcome, "Gave up waiting for target health");
            return Err(GateError::TargetUnavailable {
                route: HEALTH_ROUTE,
                reason: format!(
                    "{} after {attempts} health checks (last: {last_outcome})",
                    ctx.stop_reason()
                ),
            });
        }

        attempts += 1;
        let outcome = tokio::select! {
            () = ctx.cancel.cancelled() => continue,
            outcome = ctx.client.execute(&Operation::GetNodeHealth) => outcome,
        };

        match outcome {
            Ok(result) if matches!(result.status, 200 | 206) => {
                debug!(attempts, status = result.status, "Target healthy");
                return Ok(());
            }
            Ok(result) => {
                debug!(attempts, status = result.status, "Target not healthy yet");
                last_outcome = format!("status {}", result.status);
            }
            Err(e) => {
                debug!(attempts, error = %e, "Health check failed");
                last_outcome = e.to_string();
            }
        }

        pause(ctx).await;
    }
}

/// Waits until the target's synchronized slot reaches `slot`.
///
/// A failed or non-2xx status query and an unparsable status body are hard
/// errors; only "not there yet" is retried.
pub async fn await_slot(ctx: &ExecutionContext, slot: u64) -> Result<SyncProgress, GateError> {
    let mut last: Option<SyncProgress> = None;

    loop {
        if ctx.is_cancelled() {
            let reason = match last {
                Some(progress) => format!(
                    "{}: target is at slot {}, needs slot {slot}",
                    ctx.stop_reason(),
                    progress.current_slot()
                ),
                None => format!("{} before slot {slot} could be checked", ctx.stop_reason()),
            };
            warn!(slot, "Gave up waiting for target sync");
            return Err(GateError::TargetUnavailable {
                route: SYNCING_ROUTE,
                reason,
            });
        }

        let outcome = tokio::select! {
            () = ctx.cancel.cancelled() => continue,
            outcome = ctx.client.execute(&Operation::GetNodeSyncing) => outcome,
        };

        let unavailable = |reason: String| GateError::TargetUnavailable {
            route: SYNCING_ROUTE,
            reason,
        };
        let result = outcome.map_err(|e| unavailable(e.to_string()))?;
        if !result.is_success() {
            return Err(unavailable(format!("status query returned {}", result.status)));
        }
        let ApiResponse::Syncing(body) = &result.response else {
            return Err(unavailable(format!(
                "status query returned a {} body",
                result.response.shape()
            )));
        };

        let progress = SyncProgress::from_status(&body.data)?;
        if progress.current_slot() >= slot {
            debug!(slot, current = progress.current_slot(), "Target reached slot");
            return Ok(progress);
        }

        debug!(
            slot,
            head = progress.head_slot,
            distance = progress.sync_distance,
            "Target behind required slot"
        );
        last = Some(progress);
        pause(ctx).await;
    }
}

async fn pause(ctx: &ExecutionContext) {
    tokio::select! {
        () = ctx.cancel.cancelled() => {}
        () = tokio::time::sleep(ctx.poll_interval) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelHandle;
    use crate::testing::StubTarget;
    use comply_proto::OperationKind;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn ctx_for(stub: Arc<StubTarget>, cancel: &CancelHandle) -> ExecutionContext {
        ExecutionContext::new(stub, cancel.token(), Instant::now() + Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(10))
    }

    fn cancel_after(cancel: &CancelHandle, after: Duration) {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            cancel.cancel();
        });
    }

    #[test]
    fn test_current_slot_saturates() {
        let progress = SyncProgress {
            head_slot: 3,
            sync_distance: 10,
        };
        assert_eq!(progress.current_slot(), 0);
    }

    #[tokio::test]
    async fn test_healthy_accepts_206() {
        let stub = Arc::new(StubTarget::new().with_health(206));
        let cancel = CancelHandle::new();
        await_healthy(&ctx_for(stub.clone(), &cancel)).await.unwrap();
        assert_eq!(stub.calls_for(OperationKind::GetNodeHealth), 1);
    }

    #[tokio::test]
    async fn test_health_retries_until_ready() {
        let stub = Arc::new(StubTarget::new().with_health(503));
        let cancel = CancelHandle::new();
        let ctx = ctx_for(stub.clone(), &cancel);

        let flip = {
            let stub = stub.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                stub.set_health(200);
            })
        };

        tokio::time::timeout(Duration::from_secs(2), await_healthy(&ctx))
            .await
            .expect("gate should open")
            .unwrap();
        flip.await.unwrap();
        assert!(stub.calls_for(OperationKind::GetNodeHealth) > 1);
    }

    #[tokio::test]
    async fn test_health_cancellation_names_route() {
        let stub = Arc::new(StubTarget::new().unreachable());
        let cancel = CancelHandle::new();
        let ctx = ctx_for(stub, &cancel);
        cancel_after(&cancel, Duration::from_millis(40));

        let err = tokio::time::timeout(Duration::from_secs(2), await_healthy(&ctx))
            .await
            .expect("gate must not hang")
            .unwrap_err();
        match err {
            GateError::TargetUnavailable { route, reason } => {
                assert_eq!(route, HEALTH_ROUTE);
                assert!(reason.starts_with("run cancelled with"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_deadline_reported_as_deadline() {
        let stub = Arc::new(StubTarget::new().with_health(503));
        let cancel = CancelHandle::new();
        let ctx = ExecutionContext::new(stub, cancel.token(), Instant::now());
        cancel.cancel();

        let err = await_healthy(&ctx).await.unwrap_err();
        match err {
            GateError::TargetUnavailable { reason, .. } => {
                assert!(reason.starts_with("deadline reached after 0 health checks"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slot_waits_for_progress() {
        let stub = Arc::new(StubTarget::new().with_sync(5, 2));
        let cancel = CancelHandle::new();
        let ctx = ctx_for(stub.clone(), &cancel);

        let advance = {
            let stub = stub.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                stub.set_sync(12, 2);
            })
        };

        let progress = tokio::time::timeout(Duration::from_secs(2), await_slot(&ctx, 10))
            .await
            .expect("gate should open")
            .unwrap();
        advance.await.unwrap();
        assert_eq!(progress.current_slot(), 10);
    }

    #[tokio::test]
    async fn test_slot_behind_forever_fails_at_cancellation() {
        let stub = Arc::new(StubTarget::new().with_sync(4, 0));
        let cancel = CancelHandle::new();
        let ctx = ctx_for(stub, &cancel);
        cancel_after(&cancel, Duration::from_millis(40));

        let err = tokio::time::timeout(Duration::from_secs(2), await_slot(&ctx, 100))
            .await
            .expect("gate must not hang")
            .unwrap_err();
        match err {
            GateError::TargetUnavailable { route, reason } => {
                assert_eq!(route, SYNCING_ROUTE);
                assert!(reason.contains("slot 4"), "{reason}");
                assert!(reason.contains("slot 100"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparsable_sync_status_is_hard_error() {
        let stub = Arc::new(StubTarget::new().with_raw_sync("soon", "0"));
        let cancel = CancelHandle::new();
        let err = await_slot(&ctx_for(stub.clone(), &cancel), 1)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GateError::InvalidSyncStatus {
                field: "head_slot",
                value: "soon".to_string()
            }
        );
        assert_eq!(stub.calls_for(OperationKind::GetNodeSyncing), 1);
    }

    #[tokio::test]
    async fn test_failing_sync_route_is_unavailable() {
        let stub = Arc::new(StubTarget::new().with_response(
            OperationKind::GetNodeSyncing,
            500,
            json!({"code": 500, "message": "internal"}),
        ));
        let cancel = CancelHandle::new();
        let err = await_slot(&ctx_for(stub, &cancel), 1).await.unwrap_err();
        assert!(matches!(
            err,
            GateError::TargetUnavailable { route: SYNCING_ROUTE, .. }
        ));
    }
}
