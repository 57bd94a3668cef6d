//! Compares an actual response against a case's expectations.
//!
//! Structured expected bodies are decoded through the actual response's own
//! shape and re-encoded as RFC 8785 canonical JSON, so key order and omitted
//! fields in the fixture do not matter. Fields the model does not know are
//! dropped on both sides.

use comply_proto::{ApiResult, ResponseShape};
use serde_json::Value;

use crate::fixtures::CaseSpec;

/// The first unmet expectation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Mismatch {
    #[error("Expected status code: {expected}\nReceived status code: {actual}")]
    Status { expected: u16, actual: u16 },

    #[error("Expected response body:\n{expected}\n\nReceived response body:\n{actual}")]
    Body { expected: String, actual: String },

    #[error("Expected response body does not fit the {shape} response: {reason}")]
    UndecodableExpectation { shape: ResponseShape, reason: String },

    #[error("Could not encode the {shape} response: {reason}")]
    Unencodable { shape: ResponseShape, reason: String },
}

/// Checks status first, then body. Returns the first mismatch.
pub fn verify(spec: &CaseSpec, result: &ApiResult) -> Result<(), Mismatch> {
    if let Some(expected) = spec.expected_status()
        && expected != result.status
    {
        return Err(Mismatch::Status {
            expected,
            actual: result.status,
        });
    }

    match spec.expected_body() {
        None => Ok(()),
        Some(Value::String(text)) => verify_text(text, result),
        Some(structured) => verify_structured(structured, result),
    }
}

fn verify_text(expected: &str, result: &ApiResult) -> Result<(), Mismatch> {
    let shape = result.response.shape();
    let actual = result
        .response
        .to_text()
        .map_err(|e| Mismatch::Unencodable {
            shape,
            reason: e.to_string(),
        })?;
    if actual == expected {
        Ok(())
    } else {
        Err(Mismatch::Body {
            expected: expected.to_string(),
            actual,
        })
    }
}

fn verify_structured(expected: &Value, result: &ApiResult) -> Result<(), Mismatch> {
    let shape = result.response.shape();
    let unencodable = |e: serde_json::Error| Mismatch::Unencodable {
        shape,
        reason: e.to_string(),
    };

    let expected = shape
        .decode(expected.clone())
        .map_err(|e| Mismatch::UndecodableExpectation {
            shape,
            reason: e.to_string(),
        })?;
    let expected = expected.canonical_bytes().map_err(unencodable)?;
    let actual = result.response.canonical_bytes().map_err(unencodable)?;

    if expected == actual {
        Ok(())
    } else {
        Err(Mismatch::Body {
            expected: String::from_utf8_lossy(&expected).into_owned(),
            actual: String::from_utf8_lossy(&actual).into_owned(),
        })
    }
}
