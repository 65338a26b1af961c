//! Blocks, headers, and block identities.

use std::fmt;

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::BlockError;
use crate::evidence::Evidence;
use crate::hash::{hash_of, Hash};
use crate::tx::Tx;
use crate::vote::Commit;

/// Identity of a committed block.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockId {
    pub hash: Hash,
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.hash))
    }
}

/// A block header.
///
/// Every hash field is a deterministic function of the structure it refers
/// to; validation compares them bit-for-bit against locally derived values.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub chain_id: String,
    pub height: u64,
    pub prev_block_id: BlockId,
    /// Cumulative transaction count including this block.
    pub total_txs: u64,
    /// Digest of this block's transaction list.
    pub data_hash: Hash,
    /// Application state digest after executing the previous block.
    pub app_hash: Hash,
    pub consensus_params_hash: Hash,
    /// Digest of the previous block's execution results.
    pub last_results_hash: Hash,
    /// Digest of the validator set expected to sign this block.
    pub validators_hash: Hash,
}

impl BlockHeader {
    /// Canonical digest of the header.
    pub fn hash(&self) -> Hash {
        hash_of(self)
    }

    /// The identity this header gives the block.
    pub fn block_id(&self) -> BlockId {
        BlockId { hash: self.hash() }
    }
}

/// Digest of a transaction list.
pub fn txs_hash(txs: &[Tx]) -> Hash {
    hash_of(&txs.to_vec())
}

/// A candidate or committed block.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<Tx>,
    pub evidence: Vec<Evidence>,
    /// Aggregated signatures over the previous block.
    pub last_commit: Commit,
}

impl Block {
    /// Internal cross-field consistency, independent of any chain state.
    ///
    /// Anything caught here means the block could never be valid on any
    /// chain, so the error is always [`BlockError::Malformed`]. The
    /// cumulative `total_txs` is deliberately not inspected: only the
    /// chain-state checks can classify it, and they own that error.
    pub fn validate_basic(&self) -> Result<(), BlockError> {
        if self.header.chain_id.is_empty() {
            return Err(BlockError::Malformed("empty chain id".into()));
        }
        if self.header.height == 0 {
            return Err(BlockError::Malformed("zero height".into()));
        }
        let data_hash = txs_hash(&self.txs);
        if self.header.data_hash != data_hash {
            return Err(BlockError::Malformed(format!(
                "data hash {} does not match transactions ({} expected)",
                hex::encode(self.header.data_hash),
                hex::encode(data_hash),
            )));
        }
        if self.header.height > 1 {
            if self.last_commit.height != self.header.height - 1 {
                return Err(BlockError::Malformed(format!(
                    "last commit is for height {}, expected {}",
                    self.last_commit.height,
                    self.header.height - 1,
                )));
            }
            if self.last_commit.block_id != self.header.prev_block_id {
                return Err(BlockError::Malformed(
                    "last commit does not reference the previous block".into(),
                ));
            }
        }
        Ok(())
    }
}
