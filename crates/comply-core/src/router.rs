//! Route resolver: maps a fixture's method, route and query onto an
//! [`Operation`].
//!
//! Resolution is driven by the [`ROUTES`] table. Groups are tried in order
//! and the first group whose method matches and whose fragment occurs in the
//! path commits; later groups are never consulted. Inside a group the first
//! entry whose fragments all occur in the path wins. The beacon API's path
//! shapes do not overlap, so the order only matters where one fragment is a
//! prefix of another (`/headers/` before `/headers`).
//!
//! Matching is by substring, so `/eth/v1/node/version`, `/v1/node/version`
//! and `/node/version` all resolve to the same operation.

use std::collections::BTreeMap;
use std::str::FromStr;

use comply_proto::models::{Attestation, SignedVoluntaryExit};
use comply_proto::{Method, Operation, OperationKind};
use serde_json::Value;
use url::Url;

use crate::fixtures::CaseSpec;

/// Base used to parse relative routes.
const PLACEHOLDER_BASE: &str = "http://route.invalid/";

/// Where a positional parameter sits in the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// The segment right after the named one.
    After(&'static str),
    /// The final segment.
    Last,
}

/// One resolvable operation inside a group.
#[derive(Debug)]
pub struct RouteEntry {
    /// Every fragment must occur in the path.
    pub all_of: &'static [&'static str],
    pub params: &'static [Param],
    pub kind: OperationKind,
}

/// Entries sharing a method and a path fragment.
#[derive(Debug)]
pub struct RouteGroup {
    pub method: Method,
    pub fragment: &'static str,
    pub entries: &'static [RouteEntry],
}

const fn entry(
    all_of: &'static [&'static str],
    params: &'static [Param],
    kind: OperationKind,
) -> RouteEntry {
    RouteEntry {
        all_of,
        params,
        kind,
    }
}

const STATE: Param = Param::After("states");
const BLOCK: Param = Param::After("blocks");

/// The dispatch table, in priority order.
pub static ROUTES: &[RouteGroup] = &[
    RouteGroup {
        method: Method::Get,
        fragment: "/node/",
        entries: &[
            entry(&["/health"], &[], OperationKind::GetNodeHealth),
            entry(&["/syncing"], &[], OperationKind::GetNodeSyncing),
            entry(&["/version"], &[], OperationKind::GetNodeVersion),
            entry(&["/peers/"], &[Param::Last], OperationKind::GetNodePeer),
            entry(&["/peers"], &[], OperationKind::GetNodePeers),
            entry(&["/identity"], &[], OperationKind::GetNodeIdentity),
        ],
    },
    RouteGroup {
        method: Method::Get,
        fragment: "/beacon/",
        entries: &[
            entry(&["/beacon/genesis"], &[], OperationKind::GetGenesis),
            entry(
                &["/headers/"],
                &[Param::After("headers")],
                OperationKind::GetBlockHeader,
            ),
            entry(&["/headers"], &[], OperationKind::GetBlockHeaders),
            entry(&["/blocks/", "/root"], &[BLOCK], OperationKind::GetBlockRoot),
            entry(
                &["/blocks/", "/attestations"],
                &[BLOCK],
                OperationKind::GetBlockAttestations,
            ),
            entry(&["/blocks/"], &[BLOCK], OperationKind::GetBlock),
            entry(
                &["/pool/attestations"],
                &[],
                OperationKind::GetPoolAttestations,
            ),
            entry(
                &["/pool/attester_slashings"],
                &[],
                OperationKind::GetPoolAttesterSlashings,
            ),
            entry(
                &["/pool/proposer_slashings"],
                &[],
                OperationKind::GetPoolProposerSlashings,
            ),
            entry(
                &["/pool/voluntary_exits"],
                &[],
                OperationKind::GetPoolVoluntaryExits,
            ),
            entry(
                &["/states/", "/committees/"],
                &[STATE, Param::After("committees")],
                OperationKind::GetStateCommittees,
            ),
            entry(
                &["/states/", "/finality_checkpoints"],
                &[STATE],
                OperationKind::GetStateFinalityCheckpoints,
            ),
            entry(&["/states/", "/fork"], &[STATE], OperationKind::GetStateFork),
            entry(&["/states/", "/root"], &[STATE], OperationKind::GetStateRoot),
            entry(
                &["/states/", "/validators/"],
                &[STATE, Param::After("validators")],
                OperationKind::GetStateValidator,
            ),
            entry(
                &["/states/", "/validators"],
                &[STATE],
                OperationKind::GetStateValidators,
            ),
        ],
    },
    RouteGroup {
        method: Method::Post,
        fragment: "/beacon/pool/",
        entries: &[
            entry(
                &["/voluntary_exits"],
                &[],
                OperationKind::SubmitPoolVoluntaryExit,
            ),
            entry(
                &["/attestations"],
                &[],
                OperationKind::SubmitPoolAttestations,
            ),
        ],
    },
];

/// Errors raised while resolving a route.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// The route is not a parsable URL reference.
    #[error("Malformed route {route}: {reason}")]
    Malformed { route: String, reason: String },

    /// No table entry matches.
    #[error("Tests for the operation {method} {route} are not supported")]
    Unimplemented { method: String, route: String },

    #[error("Route {route} is missing its {param} parameter")]
    MissingParam { route: String, param: String },

    #[error("Request body for {kind} is invalid: {reason}")]
    InvalidBody { kind: OperationKind, reason: String },
}

/// A route split into its path and merged query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRoute {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl ParsedRoute {
    /// Parses `route` and merges `extra` over its own query string.
    pub fn parse(route: &str, extra: &BTreeMap<String, String>) -> Result<Self, RouteError> {
        let malformed = |reason: String| RouteError::Malformed {
            route: route.to_string(),
            reason,
        };
        let base = Url::parse(PLACEHOLDER_BASE).map_err(|e| malformed(e.to_string()))?;
        let url = base.join(route).map_err(|e| malformed(e.to_string()))?;

        let mut query: BTreeMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        query.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        Ok(Self {
            path: url.path().to_string(),
            query,
        })
    }

    fn param(&self, rule: Param) -> Result<String, RouteError> {
        let segments: Vec<&str> = self.path.split('/').collect();
        let (token, name) = match rule {
            Param::After(anchor) => (
                segments
                    .iter()
                    .position(|s| *s == anchor)
                    .and_then(|i| segments.get(i + 1))
                    .copied(),
                anchor,
            ),
            Param::Last => (segments.last().copied(), "trailing"),
        };
        match token {
            Some(t) if !t.is_empty() => Ok(t.to_string()),
            _ => Err(RouteError::MissingParam {
                route: self.path.clone(),
                param: name.to_string(),
            }),
        }
    }

    fn query_value(&self, key: &str) -> Option<String> {
        self.query.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

/// Finds the table entry for `method` and `path`.
pub fn lookup(method: Method, path: &str) -> Option<&'static RouteEntry> {
    let group = ROUTES
        .iter()
        .find(|g| g.method == method && path.contains(g.fragment))?;
    group
        .entries
        .iter()
        .find(|e| e.all_of.iter().all(|fragment| path.contains(fragment)))
}

/// Resolves a fixture into an operation.
pub fn resolve_case(spec: &CaseSpec) -> Result<Operation, RouteError> {
    resolve(
        &spec.method,
        &spec.route,
        &spec.query_params,
        spec.req_body.as_ref(),
    )
}

/// Resolves a method, route, query and optional body into an operation.
pub fn resolve(
    method: &str,
    route: &str,
    query_params: &BTreeMap<String, String>,
    body: Option<&Value>,
) -> Result<Operation, RouteError> {
    let parsed = ParsedRoute::parse(route, query_params)?;
    let unimplemented = || RouteError::Unimplemented {
        method: method.to_string(),
        route: parsed.path.clone(),
    };

    let method = Method::from_str(method).map_err(|_| unimplemented())?;
    let entry = lookup(method, &parsed.path).ok_or_else(unimplemented)?;

    let args = entry
        .params
        .iter()
        .map(|rule| parsed.param(*rule))
        .collect::<Result<Vec<_>, _>>()?;

    build(entry.kind, args, &parsed, body)
}

fn build(
    kind: OperationKind,
    args: Vec<String>,
    parsed: &ParsedRoute,
    body: Option<&Value>,
) -> Result<Operation, RouteError> {
    let mut args = args.into_iter();
    let mut arg = || args.next().unwrap_or_default();

    let op = match kind {
        OperationKind::GetNodeHealth => Operation::GetNodeHealth,
        OperationKind::GetNodeSyncing => Operation::GetNodeSyncing,
        OperationKind::GetNodeVersion => Operation::GetNodeVersion,
        OperationKind::GetNodePeer => Operation::GetNodePeer { peer_id: arg() },
        OperationKind::GetNodePeers => Operation::GetNodePeers,
        OperationKind::GetNodeIdentity => Operation::GetNodeIdentity,
        OperationKind::GetGenesis => Operation::GetGenesis,
        OperationKind::GetBlockHeader => Operation::GetBlockHeader { block_id: arg() },
        OperationKind::GetBlockHeaders => Operation::GetBlockHeaders {
            slot: parsed.query_value("slot"),
            parent_root: parsed.query_value("parent_root"),
        },
        OperationKind::GetBlock => Operation::GetBlock { block_id: arg() },
        OperationKind::GetBlockRoot => Operation::GetBlockRoot { block_id: arg() },
        OperationKind::GetBlockAttestations => Operation::GetBlockAttestations { block_id: arg() },
        OperationKind::GetPoolAttestations => Operation::GetPoolAttestations {
            slot: parsed.query_value("slot"),
            committee_index: parsed.query_value("committee_index"),
        },
        OperationKind::GetPoolAttesterSlashings => Operation::GetPoolAttesterSlashings,
        OperationKind::GetPoolProposerSlashings => Operation::GetPoolProposerSlashings,
        OperationKind::GetPoolVoluntaryExits => Operation::GetPoolVoluntaryExits,
        OperationKind::SubmitPoolVoluntaryExit => Operation::SubmitPoolVoluntaryExit {
            body: decode_body::<SignedVoluntaryExit>(kind, body)?,
        },
        OperationKind::SubmitPoolAttestations => Operation::SubmitPoolAttestations {
            body: decode_body::<Vec<Attestation>>(kind, body)?,
        },
        OperationKind::GetStateCommittees => {
            let state_id = arg();
            let epoch = arg();
            Operation::GetStateCommittees {
                state_id,
                epoch,
                index: parsed.query_value("index"),
                slot: parsed.query_value("slot"),
            }
        }
        OperationKind::GetStateFinalityCheckpoints => {
            Operation::GetStateFinalityCheckpoints { state_id: arg() }
        }
        OperationKind::GetStateFork => Operation::GetStateFork { state_id: arg() },
        OperationKind::GetStateRoot => Operation::GetStateRoot { state_id: arg() },
        OperationKind::GetStateValidator => {
            let state_id = arg();
            let validator_id = arg();
            Operation::GetStateValidator {
                state_id,
                validator_id,
            }
        }
        OperationKind::GetStateValidators => Operation::GetStateValidators {
            state_id: arg(),
            id: parsed.query_value("id"),
            status: parsed.query_value("status"),
        },
    };
    Ok(op)
}

fn decode_body<T: serde::de::DeserializeOwned>(
    kind: OperationKind,
    body: Option<&Value>,
) -> Result<T, RouteError> {
    let body = body.ok_or_else(|| RouteError::InvalidBody {
        kind,
        reason: "missing request body".to_string(),
    })?;
    serde_json::from_value(body.clone()).map_err(|e| RouteError::InvalidBody {
        kind,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get(route: &str) -> Result<Operation, RouteError> {
        resolve("GET", route, &BTreeMap::new(), None)
    }

    #[test]
    fn test_node_routes() {
        assert_eq!(get("/eth/v1/node/health").unwrap(), Operation::GetNodeHealth);
        assert_eq!(get("/eth/v1/node/syncing").unwrap(), Operation::GetNodeSyncing);
        assert_eq!(get("/eth/v1/node/version").unwrap(), Operation::GetNodeVersion);
        assert_eq!(get("/eth/v1/node/identity").unwrap(), Operation::GetNodeIdentity);
        assert_eq!(get("/eth/v1/node/peers").unwrap(), Operation::GetNodePeers);
        assert_eq!(
            get("/eth/v1/node/peers/16Uiu2HAm").unwrap(),
            Operation::GetNodePeer {
                peer_id: "16Uiu2HAm".to_string()
            }
        );
    }

    #[test]
    fn test_prefix_agnostic() {
        for route in ["/eth/v1/beacon/genesis", "/v1/beacon/genesis", "/beacon/genesis"] {
            assert_eq!(get(route).unwrap(), Operation::GetGenesis, "{route}");
        }
        assert_eq!(
            get("/v1/beacon/blocks/head/root").unwrap(),
            Operation::GetBlockRoot {
                block_id: "head".to_string()
            }
        );
    }

    #[test]
    fn test_block_routes() {
        assert_eq!(
            get("/eth/v1/beacon/blocks/12").unwrap(),
            Operation::GetBlock {
                block_id: "12".to_string()
            }
        );
        assert_eq!(
            get("/eth/v1/beacon/blocks/finalized/attestations").unwrap(),
            Operation::GetBlockAttestations {
                block_id: "finalized".to_string()
            }
        );
        assert_eq!(
            get("/eth/v1/beacon/headers/head").unwrap(),
            Operation::GetBlockHeader {
                block_id: "head".to_string()
            }
        );
    }

    #[test]
    fn test_headers_query_from_route_and_map() {
        let mut params = BTreeMap::new();
        params.insert("parent_root".to_string(), "0xaa".to_string());
        params.insert("slot".to_string(), "9".to_string());
        let op = resolve("GET", "/eth/v1/beacon/headers?slot=1", &params, None).unwrap();
        assert_eq!(
            op,
            Operation::GetBlockHeaders {
                slot: Some("9".to_string()),
                parent_root: Some("0xaa".to_string()),
            }
        );

        let op = get("/eth/v1/beacon/headers?slot=3").unwrap();
        assert_eq!(
            op,
            Operation::GetBlockHeaders {
                slot: Some("3".to_string()),
                parent_root: None,
            }
        );
    }

    #[test]
    fn test_state_routes() {
        let state = |s: &str| s.to_string();
        assert_eq!(
            get("/eth/v1/beacon/states/head/fork").unwrap(),
            Operation::GetStateFork {
                state_id: state("head")
            }
        );
        assert_eq!(
            get("/eth/v1/beacon/states/finalized/root").unwrap(),
            Operation::GetStateRoot {
                state_id: state("finalized")
            }
        );
        assert_eq!(
            get("/eth/v1/beacon/states/head/finality_checkpoints").unwrap(),
            Operation::GetStateFinalityCheckpoints {
                state_id: state("head")
            }
        );
        assert_eq!(
            get("/eth/v1/beacon/states/head/validators/7").unwrap(),
            Operation::GetStateValidator {
                state_id: state("head"),
                validator_id: state("7"),
            }
        );
        assert_eq!(
            get("/eth/v1/beacon/states/head/validators?status=active").unwrap(),
            Operation::GetStateValidators {
                state_id: state("head"),
                id: None,
                status: Some(state("active")),
            }
        );
        assert_eq!(
            get("/eth/v1/beacon/states/head/committees/2?index=0").unwrap(),
            Operation::GetStateCommittees {
                state_id: state("head"),
                epoch: state("2"),
                index: Some(state("0")),
                slot: None,
            }
        );
    }

    #[test]
    fn test_genesis_state_is_not_genesis_operation() {
        assert_eq!(
            get("/eth/v1/beacon/states/genesis/fork").unwrap(),
            Operation::GetStateFork {
                state_id: "genesis".to_string()
            }
        );
    }

    #[test]
    fn test_pool_routes() {
        assert_eq!(
            get("/eth/v1/beacon/pool/attester_slashings").unwrap(),
            Operation::GetPoolAttesterSlashings
        );
        assert_eq!(
            get("/eth/v1/beacon/pool/proposer_slashings").unwrap(),
            Operation::GetPoolProposerSlashings
        );
        assert_eq!(
            get("/eth/v1/beacon/pool/voluntary_exits").unwrap(),
            Operation::GetPoolVoluntaryExits
        );
        assert_eq!(
            get("/eth/v1/beacon/pool/attestations?committee_index=1").unwrap(),
            Operation::GetPoolAttestations {
                slot: None,
                committee_index: Some("1".to_string()),
            }
        );
    }

    #[test]
    fn test_post_routes_decode_body() {
        let body = json!({"message": {"epoch": "1", "validator_index": "2"}, "signature": "0x00"});
        let op = resolve(
            "POST",
            "/eth/v1/beacon/pool/voluntary_exits",
            &BTreeMap::new(),
            Some(&body),
        )
        .unwrap();
        match op {
            Operation::SubmitPoolVoluntaryExit { body } => {
                assert_eq!(body.message.validator_index, "2");
            }
            other => panic!("unexpected operation {other:?}"),
        }

        let err = resolve(
            "POST",
            "/eth/v1/beacon/pool/attestations",
            &BTreeMap::new(),
            Some(&json!({"not": "a list"})),
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::InvalidBody { .. }));

        let err = resolve(
            "POST",
            "/eth/v1/beacon/pool/attestations",
            &BTreeMap::new(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::InvalidBody { .. }));
    }

    #[test]
    fn test_unimplemented() {
        for (method, route) in [
            ("DELETE", "/eth/v1/node/health"),
            ("get", "/eth/v1/node/health"),
            ("GET", "/eth/v1/config/spec"),
            ("GET", "/eth/v1/node/unknown"),
            ("POST", "/eth/v1/node/health"),
        ] {
            let err = resolve(method, route, &BTreeMap::new(), None).unwrap_err();
            assert!(
                matches!(err, RouteError::Unimplemented { .. }),
                "{method} {route}: {err:?}"
            );
        }
    }

    #[test]
    fn test_missing_param() {
        let err = get("/eth/v1/beacon/states/head/validators/").unwrap_err();
        assert!(matches!(err, RouteError::MissingParam { .. }));
    }

    #[test]
    fn test_malformed_route() {
        let err = get("http://[::1").unwrap_err();
        assert!(matches!(err, RouteError::Malformed { .. }));
    }

    #[test]
    fn test_table_methods_agree_with_kinds() {
        for group in ROUTES {
            for entry in group.entries {
                assert_eq!(entry.kind.method(), group.method, "{}", entry.kind);
                let expected_params = entry.kind.route_template().matches('{').count();
                assert_eq!(entry.params.len(), expected_params, "{}", entry.kind);
            }
        }
    }

    #[test]
    fn test_every_template_resolves_to_its_kind() {
        for group in ROUTES.iter().filter(|g| g.method == Method::Get) {
            for entry in group.entries {
                let route = entry
                    .kind
                    .route_template()
                    .replace("{state_id}", "head")
                    .replace("{block_id}", "head")
                    .replace("{epoch}", "1")
                    .replace("{validator_id}", "0")
                    .replace("{peer_id}", "abc");
                let found = lookup(Method::Get, &route).map(|e| e.kind);
                assert_eq!(found, Some(entry.kind), "{route}");
            }
        }
    }
}
