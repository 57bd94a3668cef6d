//! # comply-client
//!
//! [`BeaconApi`] over HTTP. Operations are rendered onto the target's base
//! URL, request bodies are sent as JSON, and every response is handed back
//! with its status so the engine decides what a non-2xx answer means.

use async_trait::async_trait;
use comply_proto::{ApiError, ApiResult, BeaconApi, Method, Operation};
use tracing::debug;
use url::Url;

/// Errors raised while constructing a client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid target URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported scheme '{0}', expected http or https")]
    UnsupportedScheme(String),

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Beacon node reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBeaconClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpBeaconClient {
    /// Creates a client for the node at `base_url`.
    ///
    /// A path on the base URL is kept as a prefix in front of `/eth/v1`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(base)
    }

    pub fn from_url(base: Url) -> Result<Self, ClientError> {
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::UnsupportedScheme(base.scheme().to_string()));
        }
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: base.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("beacon-comply/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Full request URL for `op`, query included.
    pub fn endpoint(&self, op: &Operation) -> Url {
        let mut url = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}{}", op.path()));
        url.set_query(None);
        url.set_fragment(None);

        let query = op.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }
}

#[async_trait]
impl BeaconApi for HttpBeaconClient {
    async fn execute(&self, op: &Operation) -> Result<ApiResult, ApiError> {
        let url = self.endpoint(op);
        let route = op.path();
        debug!(operation = %op.kind(), %url, "Sending request");

        let request = match op.method() {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        };
        let request = match op {
            Operation::SubmitPoolVoluntaryExit { body } => request.json(body),
            Operation::SubmitPoolAttestations { body } => request.json(body),
            _ => request,
        };

        let transport = |e: reqwest::Error| ApiError::Transport {
            route: route.clone(),
            reason: e.to_string(),
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;
        debug!(operation = %op.kind(), status, bytes = body.len(), "Received response");

        ApiResult::from_body(op.kind(), status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = HttpBeaconClient::new("ftp://node:21").unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedScheme(s) if s == "ftp"));
        assert!(matches!(
            HttpBeaconClient::new("not a url"),
            Err(ClientError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let client = HttpBeaconClient::new("http://node:5052/proxy/").unwrap();
        assert_eq!(client.base_url().as_str(), "http://node:5052/proxy/");
        let op = Operation::GetStateFork {
            state_id: "head".to_string(),
        };
        assert_eq!(
            client.endpoint(&op).as_str(),
            "http://node:5052/proxy/eth/v1/beacon/states/head/fork"
        );
    }

    #[test]
    fn test_endpoint_adds_only_present_query_params() {
        let client = HttpBeaconClient::new("http://node:5052").unwrap();
        assert_eq!(client.base_url().path(), "/");
        let op = Operation::GetBlockHeaders {
            slot: Some("12".to_string()),
            parent_root: None,
        };
        assert_eq!(
            client.endpoint(&op).as_str(),
            "http://node:5052/eth/v1/beacon/headers?slot=12"
        );

        let op = Operation::GetBlockHeaders {
            slot: None,
            parent_root: Some(String::new()),
        };
        assert_eq!(client.endpoint(&op).query(), None);
    }
}
