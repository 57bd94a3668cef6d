//! The catalog seam between the engine and a concrete target binding.

use async_trait::async_trait;

use crate::response::{ApiResponse, ResponseShape};
use crate::{ApiError, Operation, OperationKind};

/// Outcome of one operation against the target.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult {
    pub kind: OperationKind,
    pub status: u16,
    pub response: ApiResponse,
    /// Body exactly as received.
    pub raw_body: String,
}

impl ApiResult {
    /// Builds a result from a raw body.
    ///
    /// Bodies of 2xx responses must match the operation's shape; anything
    /// else is decoded leniently as an error message, falling back to an
    /// empty one when the body is not JSON.
    pub fn from_body(kind: OperationKind, status: u16, raw_body: String) -> Result<Self, ApiError> {
        let response = if (200..300).contains(&status) {
            let shape = kind.response_shape();
            if shape == ResponseShape::Empty {
                ApiResponse::Empty
            } else {
                shape
                    .decode_slice(raw_body.as_bytes())
                    .map_err(|e| ApiError::Decode {
                        kind,
                        reason: e.to_string(),
                        body: raw_body.clone(),
                    })?
            }
        } else {
            ResponseShape::Error
                .decode_slice(raw_body.as_bytes())
                .unwrap_or_else(|_| ApiResponse::Error(Default::default()))
        };

        Ok(Self {
            kind,
            status,
            response,
            raw_body,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A callable catalog of beacon API operations.
///
/// Implementations must be stateless with respect to callers: one instance is
/// shared by every concurrently running case.
#[async_trait]
pub trait BeaconApi: Send + Sync {
    /// Issues `op` against the target.
    ///
    /// Any HTTP status is returned as `Ok`; only transport failures and
    /// undecodable 2xx bodies are errors.
    async fn execute(&self, op: &Operation) -> Result<ApiResult, ApiError>;
}
