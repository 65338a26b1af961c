//! Consensus parameters recorded in chain state.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::hash::{hash_of, Hash};

/// Parameters every validator must agree on; their hash is recorded in each
/// block header.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConsensusParams {
    /// Maximum block size in bytes.
    pub max_block_bytes: u64,
    /// Maximum number of transactions per block.
    pub max_block_txs: u64,
    /// Maximum age of misbehavior evidence, in heights. Evidence older than
    /// `last_height - max_evidence_age` is rejected.
    pub max_evidence_age: u64,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            max_block_bytes: 22_020_096,
            max_block_txs: 10_000,
            max_evidence_age: 100_000,
        }
    }
}

impl ConsensusParams {
    /// Canonical digest of the parameters.
    pub fn hash(&self) -> Hash {
        hash_of(self)
    }
}
