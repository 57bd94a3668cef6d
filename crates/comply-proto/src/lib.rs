//! # comply-proto
//!
//! Shared types, error definitions, and traits for beacon-comply.
//!
//! This crate provides the vocabulary every other crate speaks:
//! - `Operation` and `OperationKind`, the closed set of beacon API calls the
//!   runner knows how to issue
//! - Typed response models and the `ApiResponse` union over them
//! - `ResponseShape`, the factory that decodes JSON into the right model
//! - The `BeaconApi` trait implemented by the HTTP client and test stubs
//! - Common error types

mod api;
mod error;
mod method;
pub mod models;
mod operation;
mod response;

pub use api::{ApiResult, BeaconApi};
pub use error::ApiError;
pub use method::{Method, UnknownMethod};
pub use operation::{API_PREFIX, Operation, OperationKind};
pub use response::{ApiResponse, ResponseShape};
