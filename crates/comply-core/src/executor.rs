//! Case executor: drives one case from creation to its single terminal
//! disposition.
//!
//! ```text
//! Created ──(route outside subset)──▶ Skipped
//!    │
//!    ▼
//!  Gated ──▶ Dispatched ──▶ Verified ──▶ Succeeded | Failed
//! ```
//!
//! Any stage may fail; the first failure becomes the case's error.

use comply_proto::{ApiError, ApiResult};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::fixtures::CaseSpec;
use crate::gate::{self, GateError};
use crate::router::{self, RouteError};
use crate::verify::{self, Mismatch};

/// Why a case failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaseError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Route(#[from] RouteError),

    /// The target answered with something the schema does not allow, or with
    /// an error status the case did not ask for.
    #[error(
        "API error. A 404 usually means the target does not implement the route; \
         a decoding error means the route's response does not match the schema.\n\n  \
         Error:\n    {message}\n  Received server message:\n    {body}"
    )]
    Api { message: String, body: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Cancelled before the target answered")]
    Cancelled,

    #[error("Response did not satisfy expectations!\n\n{0}")]
    Expectation(#[from] Mismatch),

    #[error("Case executor stopped unexpectedly: {0}")]
    Aborted(String),
}

impl From<ApiError> for CaseError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Decode { kind, reason, body } => CaseError::Api {
                message: format!("{kind} response did not decode: {reason}"),
                body,
            },
            ApiError::Transport { .. } => CaseError::Request(err.to_string()),
            ApiError::Cancelled => CaseError::Cancelled,
        }
    }
}

/// Terminal outcome of an executed case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseResult {
    pub success: bool,
    pub error: Option<CaseError>,
}

impl CaseResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: CaseError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

/// A case and its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub spec: CaseSpec,
    pub result: CaseResult,
    pub skipped: bool,
}

impl TestCase {
    pub fn new(spec: CaseSpec) -> Self {
        Self {
            spec,
            result: CaseResult::default(),
            skipped: false,
        }
    }

    /// Executed and failed.
    pub fn is_failure(&self) -> bool {
        !self.skipped && !self.result.success
    }
}

/// Runs one case to completion.
///
/// Cases whose route does not start with `subset` are skipped without any
/// call to the target.
pub async fn execute_case(spec: CaseSpec, ctx: ExecutionContext, subset: &str) -> TestCase {
    let mut case = TestCase::new(spec);

    if !case.spec.route.starts_with(subset) {
        debug!(route = %case.spec.route, subset, "Skipping case outside subset");
        case.skipped = true;
        return case;
    }

    case.result = match run(&case.spec, &ctx).await {
        Ok(()) => CaseResult::succeeded(),
        Err(e) => {
            debug!(route = %case.spec.route, error = %e, "Case failed");
            CaseResult::failed(e)
        }
    };
    case
}

async fn run(spec: &CaseSpec, ctx: &ExecutionContext) -> Result<(), CaseError> {
    gate::await_healthy(ctx).await?;
    if let Some(slot) = spec.await_slot() {
        gate::await_slot(ctx, slot).await?;
    }

    let op = router::resolve_case(spec)?;
    debug!(operation = %op.kind(), path = %op.path(), "Dispatching");

    let result = tokio::select! {
        () = ctx.cancel.cancelled() => return Err(CaseError::Cancelled),
        outcome = ctx.client.execute(&op) => outcome?,
    };
    check_status(spec, &result)?;

    verify::verify(spec, &result)?;
    Ok(())
}

/// An error status is only acceptable when the case states which status it
/// expects; otherwise it is an API error carrying the server's payload.
fn check_status(spec: &CaseSpec, result: &ApiResult) -> Result<(), CaseError> {
    if result.is_success() || spec.expected_status().is_some() {
        return Ok(());
    }
    Err(CaseError::Api {
        message: format!("{} returned status {}", result.kind, result.status),
        body: result.raw_body.clone(),
    })
}
