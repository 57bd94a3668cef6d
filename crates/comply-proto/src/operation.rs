//! The operations a fixture can exercise.

use std::fmt;

use crate::Method;
use crate::models::{Attestation, SignedVoluntaryExit};
use crate::response::ResponseShape;

/// Path prefix every operation lives under on the target.
pub const API_PREFIX: &str = "/eth/v1";

/// A fully parameterized beacon API request.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    // ─────────────────────────────────────────────────────────────────────────
    // node
    // ─────────────────────────────────────────────────────────────────────────
    GetNodeHealth,
    GetNodeSyncing,
    GetNodeVersion,
    GetNodePeer {
        peer_id: String,
    },
    GetNodePeers,
    GetNodeIdentity,

    // ─────────────────────────────────────────────────────────────────────────
    // beacon: genesis, headers and blocks
    // ─────────────────────────────────────────────────────────────────────────
    GetGenesis,
    GetBlockHeader {
        block_id: String,
    },
    GetBlockHeaders {
        slot: Option<String>,
        parent_root: Option<String>,
    },
    GetBlock {
        block_id: String,
    },
    GetBlockRoot {
        block_id: String,
    },
    GetBlockAttestations {
        block_id: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // beacon: operation pool
    // ─────────────────────────────────────────────────────────────────────────
    GetPoolAttestations {
        slot: Option<String>,
        committee_index: Option<String>,
    },
    GetPoolAttesterSlashings,
    GetPoolProposerSlashings,
    GetPoolVoluntaryExits,
    SubmitPoolVoluntaryExit {
        body: SignedVoluntaryExit,
    },
    SubmitPoolAttestations {
        body: Vec<Attestation>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // beacon: states
    // ─────────────────────────────────────────────────────────────────────────
    GetStateCommittees {
        state_id: String,
        epoch: String,
        index: Option<String>,
        slot: Option<String>,
    },
    GetStateFinalityCheckpoints {
        state_id: String,
    },
    GetStateFork {
        state_id: String,
    },
    GetStateRoot {
        state_id: String,
    },
    GetStateValidator {
        state_id: String,
        validator_id: String,
    },
    GetStateValidators {
        state_id: String,
        id: Option<String>,
        status: Option<String>,
    },
}

/// Parameterless identity of an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    GetNodeHealth,
    GetNodeSyncing,
    GetNodeVersion,
    GetNodePeer,
    GetNodePeers,
    GetNodeIdentity,
    GetGenesis,
    GetBlockHeader,
    GetBlockHeaders,
    GetBlock,
    GetBlockRoot,
    GetBlockAttestations,
    GetPoolAttestations,
    GetPoolAttesterSlashings,
    GetPoolProposerSlashings,
    GetPoolVoluntaryExits,
    SubmitPoolVoluntaryExit,
    SubmitPoolAttestations,
    GetStateCommittees,
    GetStateFinalityCheckpoints,
    GetStateFork,
    GetStateRoot,
    GetStateValidator,
    GetStateValidators,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::GetNodeHealth => "GetNodeHealth",
            OperationKind::GetNodeSyncing => "GetNodeSyncing",
            OperationKind::GetNodeVersion => "GetNodeVersion",
            OperationKind::GetNodePeer => "GetNodePeer",
            OperationKind::GetNodePeers => "GetNodePeers",
            OperationKind::GetNodeIdentity => "GetNodeIdentity",
            OperationKind::GetGenesis => "GetGenesis",
            OperationKind::GetBlockHeader => "GetBlockHeader",
            OperationKind::GetBlockHeaders => "GetBlockHeaders",
            OperationKind::GetBlock => "GetBlock",
            OperationKind::GetBlockRoot => "GetBlockRoot",
            OperationKind::GetBlockAttestations => "GetBlockAttestations",
            OperationKind::GetPoolAttestations => "GetPoolAttestations",
            OperationKind::GetPoolAttesterSlashings => "GetPoolAttesterSlashings",
            OperationKind::GetPoolProposerSlashings => "GetPoolProposerSlashings",
            OperationKind::GetPoolVoluntaryExits => "GetPoolVoluntaryExits",
            OperationKind::SubmitPoolVoluntaryExit => "SubmitPoolVoluntaryExit",
            OperationKind::SubmitPoolAttestations => "SubmitPoolAttestations",
            OperationKind::GetStateCommittees => "GetStateCommittees",
            OperationKind::GetStateFinalityCheckpoints => "GetStateFinalityCheckpoints",
            OperationKind::GetStateFork => "GetStateFork",
            OperationKind::GetStateRoot => "GetStateRoot",
            OperationKind::GetStateValidator => "GetStateValidator",
            OperationKind::GetStateValidators => "GetStateValidators",
        }
    }

    pub fn method(self) -> Method {
        match self {
            OperationKind::SubmitPoolVoluntaryExit | OperationKind::SubmitPoolAttestations => {
                Method::Post
            }
            _ => Method::Get,
        }
    }

    /// The shape a successful response body decodes into.
    pub fn response_shape(self) -> ResponseShape {
        match self {
            OperationKind::GetNodeHealth
            | OperationKind::SubmitPoolVoluntaryExit
            | OperationKind::SubmitPoolAttestations => ResponseShape::Empty,
            OperationKind::GetNodeSyncing => ResponseShape::Syncing,
            OperationKind::GetNodeVersion => ResponseShape::Version,
            OperationKind::GetNodePeer => ResponseShape::Peer,
            OperationKind::GetNodePeers => ResponseShape::Peers,
            OperationKind::GetNodeIdentity => ResponseShape::Identity,
            OperationKind::GetGenesis => ResponseShape::Genesis,
            OperationKind::GetBlockHeader => ResponseShape::BlockHeader,
            OperationKind::GetBlockHeaders => ResponseShape::BlockHeaders,
            OperationKind::GetBlock => ResponseShape::Block,
            OperationKind::GetBlockRoot | OperationKind::GetStateRoot => ResponseShape::Root,
            OperationKind::GetBlockAttestations | OperationKind::GetPoolAttestations => {
                ResponseShape::Attestations
            }
            OperationKind::GetPoolAttesterSlashings => ResponseShape::AttesterSlashings,
            OperationKind::GetPoolProposerSlashings => ResponseShape::ProposerSlashings,
            OperationKind::GetPoolVoluntaryExits => ResponseShape::VoluntaryExits,
            OperationKind::GetStateCommittees => ResponseShape::Committees,
            OperationKind::GetStateFinalityCheckpoints => ResponseShape::FinalityCheckpoints,
            OperationKind::GetStateFork => ResponseShape::Fork,
            OperationKind::GetStateValidator => ResponseShape::Validator,
            OperationKind::GetStateValidators => ResponseShape::Validators,
        }
    }

    /// Canonical route on the target, with `{name}` placeholders.
    pub fn route_template(self) -> &'static str {
        match self {
            OperationKind::GetNodeHealth => "/eth/v1/node/health",
            OperationKind::GetNodeSyncing => "/eth/v1/node/syncing",
            OperationKind::GetNodeVersion => "/eth/v1/node/version",
            OperationKind::GetNodePeer => "/eth/v1/node/peers/{peer_id}",
            OperationKind::GetNodePeers => "/eth/v1/node/peers",
            OperationKind::GetNodeIdentity => "/eth/v1/node/identity",
            OperationKind::GetGenesis => "/eth/v1/beacon/genesis",
            OperationKind::GetBlockHeader => "/eth/v1/beacon/headers/{block_id}",
            OperationKind::GetBlockHeaders => "/eth/v1/beacon/headers",
            OperationKind::GetBlock => "/eth/v1/beacon/blocks/{block_id}",
            OperationKind::GetBlockRoot => "/eth/v1/beacon/blocks/{block_id}/root",
            OperationKind::GetBlockAttestations => "/eth/v1/beacon/blocks/{block_id}/attestations",
            OperationKind::GetPoolAttestations | OperationKind::SubmitPoolAttestations => {
                "/eth/v1/beacon/pool/attestations"
            }
            OperationKind::GetPoolAttesterSlashings => "/eth/v1/beacon/pool/attester_slashings",
            OperationKind::GetPoolProposerSlashings => "/eth/v1/beacon/pool/proposer_slashings",
            OperationKind::GetPoolVoluntaryExits | OperationKind::SubmitPoolVoluntaryExit => {
                "/eth/v1/beacon/pool/voluntary_exits"
            }
            OperationKind::GetStateCommittees => {
                "/eth/v1/beacon/states/{state_id}/committees/{epoch}"
            }
            OperationKind::GetStateFinalityCheckpoints => {
                "/eth/v1/beacon/states/{state_id}/finality_checkpoints"
            }
            OperationKind::GetStateFork => "/eth/v1/beacon/states/{state_id}/fork",
            OperationKind::GetStateRoot => "/eth/v1/beacon/states/{state_id}/root",
            OperationKind::GetStateValidator => {
                "/eth/v1/beacon/states/{state_id}/validators/{validator_id}"
            }
            OperationKind::GetStateValidators => "/eth/v1/beacon/states/{state_id}/validators",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::GetNodeHealth => OperationKind::GetNodeHealth,
            Operation::GetNodeSyncing => OperationKind::GetNodeSyncing,
            Operation::GetNodeVersion => OperationKind::GetNodeVersion,
            Operation::GetNodePeer { .. } => OperationKind::GetNodePeer,
            Operation::GetNodePeers => OperationKind::GetNodePeers,
            Operation::GetNodeIdentity => OperationKind::GetNodeIdentity,
            Operation::GetGenesis => OperationKind::GetGenesis,
            Operation::GetBlockHeader { .. } => OperationKind::GetBlockHeader,
            Operation::GetBlockHeaders { .. } => OperationKind::GetBlockHeaders,
            Operation::GetBlock { .. } => OperationKind::GetBlock,
            Operation::GetBlockRoot { .. } => OperationKind::GetBlockRoot,
            Operation::GetBlockAttestations { .. } => OperationKind::GetBlockAttestations,
            Operation::GetPoolAttestations { .. } => OperationKind::GetPoolAttestations,
            Operation::GetPoolAttesterSlashings => OperationKind::GetPoolAttesterSlashings,
            Operation::GetPoolProposerSlashings => OperationKind::GetPoolProposerSlashings,
            Operation::GetPoolVoluntaryExits => OperationKind::GetPoolVoluntaryExits,
            Operation::SubmitPoolVoluntaryExit { .. } => OperationKind::SubmitPoolVoluntaryExit,
            Operation::SubmitPoolAttestations { .. } => OperationKind::SubmitPoolAttestations,
            Operation::GetStateCommittees { .. } => OperationKind::GetStateCommittees,
            Operation::GetStateFinalityCheckpoints { .. } => {
                OperationKind::GetStateFinalityCheckpoints
            }
            Operation::GetStateFork { .. } => OperationKind::GetStateFork,
            Operation::GetStateRoot { .. } => OperationKind::GetStateRoot,
            Operation::GetStateValidator { .. } => OperationKind::GetStateValidator,
            Operation::GetStateValidators { .. } => OperationKind::GetStateValidators,
        }
    }

    pub fn method(&self) -> Method {
        self.kind().method()
    }

    /// Concrete request path on the target, including the `/eth/v1` prefix.
    pub fn path(&self) -> String {
        let rest = match self {
            Operation::GetNodeHealth => "/node/health".to_string(),
            Operation::GetNodeSyncing => "/node/syncing".to_string(),
            Operation::GetNodeVersion => "/node/version".to_string(),
            Operation::GetNodePeer { peer_id } => format!("/node/peers/{peer_id}"),
            Operation::GetNodePeers => "/node/peers".to_string(),
            Operation::GetNodeIdentity => "/node/identity".to_string(),
            Operation::GetGenesis => "/beacon/genesis".to_string(),
            Operation::GetBlockHeader { block_id } => format!("/beacon/headers/{block_id}"),
            Operation::GetBlockHeaders { .. } => "/beacon/headers".to_string(),
            Operation::GetBlock { block_id } => format!("/beacon/blocks/{block_id}"),
            Operation::GetBlockRoot { block_id } => format!("/beacon/blocks/{block_id}/root"),
            Operation::GetBlockAttestations { block_id } => {
                format!("/beacon/blocks/{block_id}/attestations")
            }
            Operation::GetPoolAttestations { .. } | Operation::SubmitPoolAttestations { .. } => {
                "/beacon/pool/attestations".to_string()
            }
            Operation::GetPoolAttesterSlashings => "/beacon/pool/attester_slashings".to_string(),
            Operation::GetPoolProposerSlashings => "/beacon/pool/proposer_slashings".to_string(),
            Operation::GetPoolVoluntaryExits | Operation::SubmitPoolVoluntaryExit { .. } => {
                "/beacon/pool/voluntary_exits".to_string()
            }
            Operation::GetStateCommittees {
                state_id, epoch, ..
            } => format!("/beacon/states/{state_id}/committees/{epoch}"),
            Operation::GetStateFinalityCheckpoints { state_id } => {
                format!("/beacon/states/{state_id}/finality_checkpoints")
            }
            Operation::GetStateFork { state_id } => format!("/beacon/states/{state_id}/fork"),
            Operation::GetStateRoot { state_id } => format!("/beacon/states/{state_id}/root"),
            Operation::GetStateValidator {
                state_id,
                validator_id,
            } => format!("/beacon/states/{state_id}/validators/{validator_id}"),
            Operation::GetStateValidators { state_id, .. } => {
                format!("/beacon/states/{state_id}/validators")
            }
        };
        format!("{API_PREFIX}{rest}")
    }

    /// Query parameters to send, omitting any that are unset or empty.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let pairs: Vec<(&'static str, Option<&String>)> = match self {
            Operation::GetBlockHeaders { slot, parent_root } => {
                vec![("slot", slot.as_ref()), ("parent_root", parent_root.as_ref())]
            }
            Operation::GetPoolAttestations {
                slot,
                committee_index,
            } => vec![
                ("slot", slot.as_ref()),
                ("committee_index", committee_index.as_ref()),
            ],
            Operation::GetStateCommittees { index, slot, .. } => {
                vec![("index", index.as_ref()), ("slot", slot.as_ref())]
            }
            Operation::GetStateValidators { id, status, .. } => {
                vec![("id", id.as_ref()), ("status", status.as_ref())]
            }
            _ => Vec::new(),
        };
        pairs
            .into_iter()
            .filter_map(|(key, value)| match value {
                Some(v) if !v.is_empty() => Some((key, v.clone())),
                _ => None,
            })
            .collect()
    }
}
