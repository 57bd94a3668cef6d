//! Fixture files: one JSON test case per file.
//!
//! # Example
//!
//! ```
//! use comply_core::fixtures::CaseSpec;
//!
//! let spec: CaseSpec = serde_json::from_str(
//!     r#"{"method": "GET", "route": "/eth/v1/beacon/genesis", "expectedRespStatus": 200}"#,
//! )
//! .unwrap();
//!
//! assert_eq!(spec.expected_status(), Some(200));
//! assert_eq!(spec.await_slot(), None);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A declarative description of one request and what the response must be.
///
/// Keys are camelCase; PascalCase spellings are accepted as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSpec {
    #[serde(alias = "Method")]
    pub method: String,

    /// Request path, optionally carrying a query string.
    #[serde(alias = "Route")]
    pub route: String,

    #[serde(default, alias = "QueryParams")]
    pub query_params: BTreeMap<String, String>,

    /// Minimum synchronized slot before the case may run. `0` means none.
    #[serde(default, alias = "AwaitSlot")]
    pub await_slot: Option<u64>,

    #[serde(default, alias = "ReqBody")]
    pub req_body: Option<Value>,

    /// `0` means no expectation.
    #[serde(default, alias = "ExpectedRespStatus")]
    pub expected_resp_status: Option<u16>,

    /// A JSON string is compared as literal text; anything else structurally.
    #[serde(default, alias = "ExpectedRespBody")]
    pub expected_resp_body: Option<Value>,
}

impl CaseSpec {
    pub fn new(method: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            route: route.into(),
            ..Self::default()
        }
    }

    pub fn get(route: impl Into<String>) -> Self {
        Self::new("GET", route)
    }

    pub fn post(route: impl Into<String>, body: Value) -> Self {
        Self::new("POST", route).req_body(body)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    pub fn await_slot_at(mut self, slot: u64) -> Self {
        self.await_slot = Some(slot);
        self
    }

    pub fn req_body(mut self, body: Value) -> Self {
        self.req_body = Some(body);
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expected_resp_status = Some(status);
        self
    }

    pub fn expect_body(mut self, body: Value) -> Self {
        self.expected_resp_body = Some(body);
        self
    }

    /// Required slot, if any.
    pub fn await_slot(&self) -> Option<u64> {
        self.await_slot.filter(|slot| *slot > 0)
    }

    /// Expected status, if any.
    pub fn expected_status(&self) -> Option<u16> {
        self.expected_resp_status.filter(|status| *status != 0)
    }

    /// Expected body, if any.
    pub fn expected_body(&self) -> Option<&Value> {
        self.expected_resp_body.as_ref().filter(|body| !body.is_null())
    }

    /// Key used to order results: cases without a slot first.
    pub fn sort_key(&self) -> u64 {
        self.await_slot().unwrap_or(0)
    }

    fn validate(&self) -> Result<(), String> {
        if self.method.trim().is_empty() {
            return Err("method must not be empty".to_string());
        }
        if self.route.trim().is_empty() {
            return Err("route must not be empty".to_string());
        }
        Ok(())
    }
}

/// A case together with the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCase {
    pub path: PathBuf,
    pub spec: CaseSpec,
}

/// Errors that abort loading. Any one of them fails the whole load.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid test case {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl FixtureError {
    pub fn path(&self) -> &Path {
        match self {
            FixtureError::Io { path, .. }
            | FixtureError::Parse { path, .. }
            | FixtureError::Invalid { path, .. } => path,
        }
    }
}

/// Parses one fixture file.
pub fn load_fixture(path: impl AsRef<Path>) -> Result<LoadedCase, FixtureError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let spec: CaseSpec = serde_json::from_str(&content).map_err(|source| FixtureError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    spec.validate().map_err(|reason| FixtureError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(LoadedCase {
        path: path.to_path_buf(),
        spec,
    })
}

/// Recursively loads every file under `root`, in sorted path order.
///
/// Every non-directory file must be a valid case; the first bad one fails
/// the load.
pub fn load_fixtures(root: impl AsRef<Path>) -> Result<Vec<LoadedCase>, FixtureError> {
    let root = root.as_ref();
    let mut cases = Vec::new();
    collect(root, &mut cases)?;
    debug!(root = %root.display(), count = cases.len(), "Loaded fixtures");
    Ok(cases)
}

fn collect(dir: &Path, cases: &mut Vec<LoadedCase>) -> Result<(), FixtureError> {
    let io_err = |source| FixtureError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = std::fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect(&path, cases)?;
        } else {
            cases.push(load_fixture(&path)?);
        }
    }
    Ok(())
}
