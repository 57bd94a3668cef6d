//! The closed set of response shapes and their canonical encoding.
//!
//! Every operation maps to exactly one [`ResponseShape`]. The shape is the
//! factory used both for wire bodies and for expected-body literals written
//! in fixtures, so both sides of a comparison land in the same typed model
//! before they are canonicalized.

use std::fmt;

use serde::Serialize;
use serde::de::Error as _;
use serde_json::Value;

use crate::models::{
    Attestation, AttesterSlashing, BlockHeaderData, Committee, DataResponse, ErrorMessage,
    FinalityCheckpoints, Fork, Genesis, NetworkIdentity, Peer, ProposerSlashing, RootData,
    SignedBeaconBlock, SignedVoluntaryExit, SyncingStatus, ValidatorData, Version,
};

macro_rules! response_shapes {
    ($($variant:ident => $model:ty),+ $(,)?) => {
        /// A decoded response, tagged by shape.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum ApiResponse {
            $($variant($model),)+
            /// Status-only operations carry no body.
            Empty,
            /// Body of a non-2xx response.
            Error(ErrorMessage),
        }

        /// Identity of a response model; decodes JSON into the matching variant.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ResponseShape {
            $($variant,)+
            Empty,
            Error,
        }

        impl ResponseShape {
            /// Decodes a JSON value into this shape's model.
            ///
            /// Unknown fields are dropped and missing ones defaulted, so the
            /// result is the normalized form of `value`.
            pub fn decode(self, value: Value) -> Result<ApiResponse, serde_json::Error> {
                match self {
                    $(ResponseShape::$variant => {
                        serde_json::from_value(value).map(ApiResponse::$variant)
                    })+
                    ResponseShape::Empty => match value {
                        Value::Null => Ok(ApiResponse::Empty),
                        _ => Err(serde_json::Error::custom("expected no body")),
                    },
                    ResponseShape::Error => serde_json::from_value(value).map(ApiResponse::Error),
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(ResponseShape::$variant => stringify!($variant),)+
                    ResponseShape::Empty => "Empty",
                    ResponseShape::Error => "Error",
                }
            }
        }

        impl ApiResponse {
            pub fn shape(&self) -> ResponseShape {
                match self {
                    $(ApiResponse::$variant(_) => ResponseShape::$variant,)+
                    ApiResponse::Empty => ResponseShape::Empty,
                    ApiResponse::Error(_) => ResponseShape::Error,
                }
            }
        }
    };
}

response_shapes! {
    Syncing => DataResponse<SyncingStatus>,
    Version => DataResponse<Version>,
    Peer => DataResponse<Peer>,
    Peers => DataResponse<Vec<Peer>>,
    Identity => DataResponse<NetworkIdentity>,
    Genesis => DataResponse<Genesis>,
    BlockHeader => DataResponse<BlockHeaderData>,
    BlockHeaders => DataResponse<Vec<BlockHeaderData>>,
    Block => DataResponse<SignedBeaconBlock>,
    Root => DataResponse<RootData>,
    Attestations => DataResponse<Vec<Attestation>>,
    AttesterSlashings => DataResponse<Vec<AttesterSlashing>>,
    ProposerSlashings => DataResponse<Vec<ProposerSlashing>>,
    VoluntaryExits => DataResponse<Vec<SignedVoluntaryExit>>,
    Committees => DataResponse<Vec<Committee>>,
    FinalityCheckpoints => DataResponse<FinalityCheckpoints>,
    Fork => DataResponse<Fork>,
    Validator => DataResponse<ValidatorData>,
    Validators => DataResponse<Vec<ValidatorData>>,
}

impl ResponseShape {
    /// Decodes raw bytes. An empty slice is treated as JSON `null`.
    pub fn decode_slice(self, bytes: &[u8]) -> Result<ApiResponse, serde_json::Error> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return self.decode(Value::Null);
        }
        self.decode(serde_json::from_slice(bytes)?)
    }
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ApiResponse {
    /// RFC 8785 canonical JSON encoding of the typed model.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_jcs::to_vec(self)
    }

    /// Canonical text form; empty for [`ApiResponse::Empty`].
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        if matches!(self, ApiResponse::Empty) {
            return Ok(String::new());
        }
        let bytes = self.canonical_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
