//! Errors surfaced by an operation catalog.

use crate::OperationKind;

/// Error returned by a [`BeaconApi`](crate::BeaconApi) implementation.
///
/// A response with any HTTP status is not an error; only failures to reach
/// the target or to make sense of what it sent are.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("request to {route} failed: {reason}")]
    Transport { route: String, reason: String },

    /// The target answered but the body does not fit the operation's schema.
    #[error("{kind} response did not decode: {reason}; body: {body}")]
    Decode {
        kind: OperationKind,
        reason: String,
        body: String,
    },

    /// The call was abandoned because the run was cancelled.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Returns the raw server payload when the error carries one.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Decode { body, .. } => Some(body),
            _ => None,
        }
    }
}
