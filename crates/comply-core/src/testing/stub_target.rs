//! In-memory target for deterministic engine tests.
//!
//! `StubTarget` implements [`BeaconApi`] without any network. Health status,
//! sync progress and per-operation responses are scripted up front and may be
//! changed while a run is in flight; every call is counted.
//!
//! # Example
//!
//! ```
//! use comply_core::testing::StubTarget;
//! use comply_proto::OperationKind;
//! use serde_json::json;
//!
//! let stub = StubTarget::new()
//!     .with_sync(32, 0)
//!     .with_response(OperationKind::GetNodeVersion, 200, json!({"data": {"version": "stub/v1"}}));
//!
//! assert_eq!(stub.call_count(), 0);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use comply_proto::models::{DataResponse, SyncingStatus};
use comply_proto::{ApiError, ApiResult, BeaconApi, Operation, OperationKind};
use serde_json::Value;

/// Body served for operations without a scripted response.
const NOT_FOUND_BODY: &str = r#"{"code":404,"message":"Not found"}"#;

/// A scripted, call-counting stand-in for a beacon node.
#[derive(Debug)]
pub struct StubTarget {
    health_status: AtomicU16,
    reachable: AtomicBool,
    sync: Mutex<SyncingStatus>,
    responses: Mutex<HashMap<OperationKind, (u16, String)>>,
    latency: Duration,
    latency_for: HashMap<OperationKind, Duration>,
    calls: AtomicUsize,
    log: Mutex<Vec<OperationKind>>,
    completed: Mutex<Vec<OperationKind>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StubTarget {
    /// A healthy, reachable target at slot 0 with no scripted responses.
    pub fn new() -> Self {
        Self {
            health_status: AtomicU16::new(200),
            reachable: AtomicBool::new(true),
            sync: Mutex::new(sync_status(0, 0)),
            responses: Mutex::new(HashMap::new()),
            latency: Duration::ZERO,
            latency_for: HashMap::new(),
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        }
    }

    /// Status returned by the health route.
    pub fn with_health(self, status: u16) -> Self {
        self.set_health(status);
        self
    }

    /// Every call fails with a transport error.
    pub fn unreachable(self) -> Self {
        self.reachable.store(false, Ordering::SeqCst);
        self
    }

    pub fn with_sync(self, head_slot: u64, sync_distance: u64) -> Self {
        self.set_sync(head_slot, sync_distance);
        self
    }

    /// Sync fields served verbatim, for exercising parse failures.
    pub fn with_raw_sync(self, head_slot: &str, sync_distance: &str) -> Self {
        *lock(&self.sync) = SyncingStatus {
            head_slot: head_slot.to_string(),
            sync_distance: sync_distance.to_string(),
            is_syncing: None,
        };
        self
    }

    /// Scripts a JSON response for `kind`.
    pub fn with_response(self, kind: OperationKind, status: u16, body: Value) -> Self {
        let raw = if body.is_null() {
            String::new()
        } else {
            body.to_string()
        };
        self.with_raw_response(kind, status, raw)
    }

    /// Scripts a response body served byte for byte.
    pub fn with_raw_response(self, kind: OperationKind, status: u16, body: impl Into<String>) -> Self {
        lock(&self.responses).insert(kind, (status, body.into()));
        self
    }

    /// Delay applied before answering every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delay for one operation, replacing the shared latency for it.
    pub fn with_latency_for(mut self, kind: OperationKind, latency: Duration) -> Self {
        self.latency_for.insert(kind, latency);
        self
    }

    pub fn set_health(&self, status: u16) {
        self.health_status.store(status, Ordering::SeqCst);
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_sync(&self, head_slot: u64, sync_distance: u64) {
        *lock(&self.sync) = sync_status(head_slot, sync_distance);
    }

    /// Total calls of any operation.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls of one operation.
    pub fn calls_for(&self, kind: OperationKind) -> usize {
        lock(&self.log).iter().filter(|k| **k == kind).count()
    }

    /// Every call so far, in arrival order.
    pub fn call_log(&self) -> Vec<OperationKind> {
        lock(&self.log).clone()
    }

    /// Operations that have answered, in completion order.
    pub fn completion_log(&self) -> Vec<OperationKind> {
        lock(&self.completed).clone()
    }

    fn respond(&self, kind: OperationKind) -> (u16, String) {
        if let Some(scripted) = lock(&self.responses).get(&kind) {
            return scripted.clone();
        }
        match kind {
            OperationKind::GetNodeHealth => (self.health_status.load(Ordering::SeqCst), String::new()),
            OperationKind::GetNodeSyncing => {
                let body = DataResponse::new(lock(&self.sync).clone());
                let raw = serde_json::to_string(&body).unwrap_or_default();
                (200, raw)
            }
            _ => (404, NOT_FOUND_BODY.to_string()),
        }
    }
}

impl Default for StubTarget {
    fn default() -> Self {
        Self::new()
    }
}

fn sync_status(head_slot: u64, sync_distance: u64) -> SyncingStatus {
    SyncingStatus {
        head_slot: head_slot.to_string(),
        sync_distance: sync_distance.to_string(),
        is_syncing: Some(sync_distance > 0),
    }
}

#[async_trait]
impl BeaconApi for StubTarget {
    async fn execute(&self, op: &Operation) -> Result<ApiResult, ApiError> {
        let kind = op.kind();
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.log).push(kind);

        let latency = self.latency_for.get(&kind).copied().unwrap_or(self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let outcome = if self.reachable.load(Ordering::SeqCst) {
            let (status, body) = self.respond(kind);
            ApiResult::from_body(kind, status, body)
        } else {
            Err(ApiError::Transport {
                route: op.path(),
                reason: "connection refused".to_string(),
            })
        };
        lock(&self.completed).push(kind);
        outcome
    }
}
