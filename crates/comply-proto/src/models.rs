//! Typed beacon API models (phase 0).
//!
//! Numeric quantities travel as decimal strings and byte arrays as `0x`
//! prefixed hex, exactly as the API publishes them. Every struct defaults
//! missing fields so hand-written expectations may omit what they do not
//! care about; unknown fields are ignored on decode. An explicit `null` reads
//! as the field's default, the same as an omitted one.

use serde::{Deserialize, Deserializer, Serialize};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `{ "data": ... }` envelope wrapping every successful response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Body returned by the API for non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub stacktraces: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Genesis {
    #[serde(deserialize_with = "null_as_default")]
    pub genesis_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub genesis_validators_root: String,
    #[serde(deserialize_with = "null_as_default")]
    pub genesis_fork_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootData {
    #[serde(deserialize_with = "null_as_default")]
    pub root: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fork {
    #[serde(deserialize_with = "null_as_default")]
    pub previous_version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub current_version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub epoch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Checkpoint {
    #[serde(deserialize_with = "null_as_default")]
    pub epoch: String,
    #[serde(deserialize_with = "null_as_default")]
    pub root: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalityCheckpoints {
    #[serde(deserialize_with = "null_as_default")]
    pub previous_justified: Checkpoint,
    #[serde(deserialize_with = "null_as_default")]
    pub current_justified: Checkpoint,
    #[serde(deserialize_with = "null_as_default")]
    pub finalized: Checkpoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Validator {
    #[serde(deserialize_with = "null_as_default")]
    pub pubkey: String,
    #[serde(deserialize_with = "null_as_default")]
    pub withdrawal_credentials: String,
    #[serde(deserialize_with = "null_as_default")]
    pub effective_balance: String,
    #[serde(deserialize_with = "null_as_default")]
    pub slashed: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub activation_eligibility_epoch: String,
    #[serde(deserialize_with = "null_as_default")]
    pub activation_epoch: String,
    #[serde(deserialize_with = "null_as_default")]
    pub exit_epoch: String,
    #[serde(deserialize_with = "null_as_default")]
    pub withdrawable_epoch: String,
}

/// A validator entry as returned by the state validator routes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorData {
    #[serde(deserialize_with = "null_as_default")]
    pub index: String,
    #[serde(deserialize_with = "null_as_default")]
    pub balance: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub validator: Validator,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Committee {
    #[serde(deserialize_with = "null_as_default")]
    pub index: String,
    #[serde(deserialize_with = "null_as_default")]
    pub slot: String,
    #[serde(deserialize_with = "null_as_default")]
    pub validators: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconBlockHeader {
    #[serde(deserialize_with = "null_as_default")]
    pub slot: String,
    #[serde(deserialize_with = "null_as_default")]
    pub proposer_index: String,
    #[serde(deserialize_with = "null_as_default")]
    pub parent_root: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state_root: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body_root: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignedBeaconBlockHeader {
    #[serde(deserialize_with = "null_as_default")]
    pub message: BeaconBlockHeader,
    #[serde(deserialize_with = "null_as_default")]
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockHeaderData {
    #[serde(deserialize_with = "null_as_default")]
    pub root: String,
    #[serde(deserialize_with = "null_as_default")]
    pub canonical: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub header: SignedBeaconBlockHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Eth1Data {
    #[serde(deserialize_with = "null_as_default")]
    pub deposit_root: String,
    #[serde(deserialize_with = "null_as_default")]
    pub deposit_count: String,
    #[serde(deserialize_with = "null_as_default")]
    pub block_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttestationData {
    #[serde(deserialize_with = "null_as_default")]
    pub slot: String,
    #[serde(deserialize_with = "null_as_default")]
    pub index: String,
    #[serde(deserialize_with = "null_as_default")]
    pub beacon_block_root: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: Checkpoint,
    #[serde(deserialize_with = "null_as_default")]
    pub target: Checkpoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attestation {
    #[serde(deserialize_with = "null_as_default")]
    pub aggregation_bits: String,
    #[serde(deserialize_with = "null_as_default")]
    pub signature: String,
    #[serde(deserialize_with = "null_as_default")]
    pub data: AttestationData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexedAttestation {
    #[serde(deserialize_with = "null_as_default")]
    pub attesting_indices: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub signature: String,
    #[serde(deserialize_with = "null_as_default")]
    pub data: AttestationData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttesterSlashing {
    #[serde(deserialize_with = "null_as_default")]
    pub attestation_1: IndexedAttestation,
    #[serde(deserialize_with = "null_as_default")]
    pub attestation_2: IndexedAttestation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposerSlashing {
    #[serde(deserialize_with = "null_as_default")]
    pub signed_header_1: SignedBeaconBlockHeader,
    #[serde(deserialize_with = "null_as_default")]
    pub signed_header_2: SignedBeaconBlockHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositData {
    #[serde(deserialize_with = "null_as_default")]
    pub pubkey: String,
    #[serde(deserialize_with = "null_as_default")]
    pub withdrawal_credentials: String,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: String,
    #[serde(deserialize_with = "null_as_default")]
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deposit {
    #[serde(deserialize_with = "null_as_default")]
    pub proof: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub data: DepositData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoluntaryExit {
    #[serde(deserialize_with = "null_as_default")]
    pub epoch: String,
    #[serde(deserialize_with = "null_as_default")]
    pub validator_index: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignedVoluntaryExit {
    #[serde(deserialize_with = "null_as_default")]
    pub message: VoluntaryExit,
    #[serde(deserialize_with = "null_as_default")]
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconBlockBody {
    #[serde(deserialize_with = "null_as_default")]
    pub randao_reveal: String,
    #[serde(deserialize_with = "null_as_default")]
    pub eth1_data: Eth1Data,
    #[serde(deserialize_with = "null_as_default")]
    pub graffiti: String,
    #[serde(deserialize_with = "null_as_default")]
    pub proposer_slashings: Vec<ProposerSlashing>,
    #[serde(deserialize_with = "null_as_default")]
    pub attester_slashings: Vec<AttesterSlashing>,
    #[serde(deserialize_with = "null_as_default")]
    pub attestations: Vec<Attestation>,
    #[serde(deserialize_with = "null_as_default")]
    pub deposits: Vec<Deposit>,
    #[serde(deserialize_with = "null_as_default")]
    pub voluntary_exits: Vec<SignedVoluntaryExit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconBlock {
    #[serde(deserialize_with = "null_as_default")]
    pub slot: String,
    #[serde(deserialize_with = "null_as_default")]
    pub proposer_index: String,
    #[serde(deserialize_with = "null_as_default")]
    pub parent_root: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state_root: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body: BeaconBlockBody,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignedBeaconBlock {
    #[serde(deserialize_with = "null_as_default")]
    pub message: BeaconBlock,
    #[serde(deserialize_with = "null_as_default")]
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub seq_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub attnets: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkIdentity {
    #[serde(deserialize_with = "null_as_default")]
    pub peer_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enr: String,
    #[serde(deserialize_with = "null_as_default")]
    pub p2p_addresses: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub discovery_addresses: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: NodeMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Peer {
    #[serde(deserialize_with = "null_as_default")]
    pub peer_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enr: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_seen_p2p_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub direction: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Version {
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
}

/// Sync progress reported by `/eth/v1/node/syncing`.
///
/// `head_slot` and `sync_distance` are decimal strings; the readiness gate
/// parses them and treats a parse failure as a broken status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncingStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub head_slot: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sync_distance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_syncing: Option<bool>,
}
