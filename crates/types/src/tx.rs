//! Transactions as the core sees them: raw bytes plus a content hash.
//!
//! Transactions are opaque to the node; only the external application can
//! interpret them. The node identifies a transaction solely by the SHA-256
//! digest of its raw bytes.

use std::fmt;

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::hash;

/// Raw transaction bytes.
pub type Tx = Vec<u8>;

/// The response code the application returns for a successful check.
pub const CODE_OK: u32 = 0;

/// Content-derived transaction identity.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize,
)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    /// Hashes raw transaction bytes.
    pub fn of(tx: &[u8]) -> Self {
        Self(hash::sha256(tx))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}

/// Result of checking or executing a transaction, as reported by the
/// application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    /// Application response code; [`CODE_OK`] means success.
    pub code: u32,
    /// Opaque application payload.
    pub data: Vec<u8>,
    /// Human-readable log line.
    pub log: String,
}

impl TxResult {
    /// Whether the application accepted the transaction.
    pub fn ok(&self) -> bool {
        self.code == CODE_OK
    }
}

/// Acknowledgement returned by the application for control requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppAck {
    pub code: u32,
    pub log: String,
}

impl AppAck {
    pub fn ok(&self) -> bool {
        self.code == CODE_OK
    }
}
