//! Ledger-specific types and error definitions.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;
use thiserror::Error;

use crate::ledger::encoding::{b64_decode, b64_encode};

/// Errors that can occur while loading keys, building transactions or
/// talking to the gateway.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The wallet file could not be read.
    #[error("Unable to read wallet file {path}: {source}")]
    WalletFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JWK document is malformed or does not describe an RSA key.
    #[error("Key format error: {0}")]
    KeyFormat(String),

    /// Signing was attempted with a wallet holding only the public key.
    #[error("Wallet has no private key material")]
    MissingPrivateKey,

    /// The RSA-PSS primitive failed to produce a signature.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A signature did not verify against the public key.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// A field could not be decoded while building the signing message.
    #[error("Encoding error in field '{field}': {source}")]
    Encoding {
        field: String,
        #[source]
        source: base64::DecodeError,
    },

    /// A wire field could not be decoded.
    #[error("Decode error in field '{field}': {reason}")]
    Decode { field: String, reason: String },

    /// The wire body could not be serialized or parsed as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport level failure talking to the gateway.
    #[error("Network error during {op}: {reason}")]
    Network { op: &'static str, reason: String },

    /// The gateway answered with a non-success status.
    #[error("Network error during {op}: gateway returned {status}: {body}")]
    Status {
        op: &'static str,
        status: u16,
        body: String,
    },

    /// An uploader setting is out of range.
    #[error("Invalid setting '{field}': {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    /// An upload was attempted without a signing wallet.
    #[error("No wallet with private key material configured for upload")]
    NoWallet,

    /// The operation was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// The caller's deadline expired before the operation completed.
    #[error("Deadline exceeded")]
    DeadlineExceeded,
}

impl LedgerError {
    /// True for transport and protocol failures reported by the gateway.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Status { .. })
    }

    /// True when the caller's cancellation scope ended the operation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    pub(crate) fn network(op: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Network {
            op,
            reason: err.to_string(),
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// A transaction tag, held as the raw bytes of its name and value.
///
/// Tags are usually text, but the network accepts arbitrary bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

impl Tag {
    pub fn new(name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Name as text, with invalid UTF-8 replaced.
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Value as text, with invalid UTF-8 replaced.
    pub fn value_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }

    /// Encode both fields for the wire.
    pub fn encode(&self) -> WireTag {
        WireTag {
            name: b64_encode(&self.name),
            value: b64_encode(&self.value),
        }
    }

    /// Decode a wire tag. `index` is only used to name the failing field.
    pub fn decode(wire: &WireTag, index: usize) -> LedgerResult<Self> {
        Ok(Self {
            name: decode_tag_field(&wire.name, index, "name")?,
            value: decode_tag_field(&wire.value, index, "value")?,
        })
    }
}

fn decode_tag_field(encoded: &str, index: usize, part: &str) -> LedgerResult<Vec<u8>> {
    b64_decode(encoded).map_err(|e| LedgerError::Decode {
        field: format!("tags[{}].{}", index, part),
        reason: e.to_string(),
    })
}

/// Tag as it appears on the wire, both fields URL-safe base64.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WireTag {
    pub name: String,
    pub value: String,
}

/// JSON body exchanged with the gateway.
///
/// Every field is always serialized, so an empty `target` goes out as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionJson {
    pub id: String,
    pub last_tx: String,
    pub owner: String,
    pub tags: Vec<WireTag>,
    pub target: String,
    pub quantity: String,
    pub data: String,
    pub reward: String,
    pub signature: String,
}

/// Acknowledgement returned by the gateway after a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAck {
    pub status: u16,
    pub body: String,
}
