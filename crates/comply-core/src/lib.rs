//! # comply-core
//!
//! The test execution engine for beacon-comply.
//!
//! This crate provides:
//! - Fixture loading from a directory tree of JSON case definitions
//! - The route resolver mapping a fixture onto a catalog operation
//! - The readiness gate (target health and sync progress)
//! - The case executor and the response verifier
//! - The scheduler running all cases under one global deadline
//! - Configuration loading and result formatting
//! - A scripted stub target for tests

mod cancel;
pub mod config;
mod context;
pub mod executor;
pub mod fixtures;
pub mod gate;
pub mod report;
pub mod router;
mod scheduler;
pub mod testing;
pub mod verify;

pub use cancel::{CancelHandle, Cancellation};
pub use config::{ComplyConfig, ConfigError, ConfigWarning};
pub use context::{DEFAULT_POLL_INTERVAL, ExecutionContext};
pub use executor::{CaseError, CaseResult, TestCase, execute_case};
pub use fixtures::{CaseSpec, FixtureError, LoadedCase, load_fixtures};
pub use gate::{GateError, SyncProgress};
pub use router::{ParsedRoute, RouteError};
pub use scheduler::{RunSummary, Scheduler};
pub use verify::Mismatch;
