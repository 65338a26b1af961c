//! Votes and aggregated commits.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::block::BlockId;
use crate::codec;
use crate::hash::Hash;
use crate::validator::Address;

/// The canonical signing payload for a vote.
///
/// Binding the chain id into the payload is what makes signatures from one
/// chain worthless on another.
#[derive(Encode)]
struct CanonicalVote {
    chain_id: String,
    height: u64,
    round: u32,
    block_hash: Hash,
}

/// Canonical sign-bytes for a vote over `block_hash` at `(height, round)`.
pub fn sign_bytes(chain_id: &str, height: u64, round: u32, block_hash: &Hash) -> Vec<u8> {
    codec::to_bytes_canonical(&CanonicalVote {
        chain_id: chain_id.to_string(),
        height,
        round,
        block_hash: *block_hash,
    })
}

/// A single validator's signed vote for a block.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub height: u64,
    pub round: u32,
    pub block_id: BlockId,
    pub validator_address: Address,
    /// Position of the validator in the set effective at `height`.
    pub validator_index: u32,
    pub signature: Vec<u8>,
}

impl Vote {
    /// Verifies the vote's signature under `pub_key` for `chain_id`.
    pub fn verify(&self, chain_id: &str, pub_key: &[u8; 32]) -> Result<(), String> {
        let key = VerifyingKey::from_bytes(pub_key).map_err(|e| format!("bad public key: {e}"))?;
        let signature = Signature::from_slice(&self.signature)
            .map_err(|e| format!("bad signature encoding: {e}"))?;
        let msg = sign_bytes(chain_id, self.height, self.round, &self.block_id.hash);
        key.verify(&msg, &signature)
            .map_err(|e| format!("vote signature does not verify: {e}"))
    }
}

/// One entry of an aggregated commit.
///
/// Entries are aligned positionally with the validator set of the commit's
/// height; an absent vote is represented by `None` in [`Commit::signatures`].
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommitSig {
    pub validator_address: Address,
    pub signature: Vec<u8>,
}

/// Aggregated validator signatures over a previous block.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Commit {
    pub height: u64,
    pub round: u32,
    pub block_id: BlockId,
    pub signatures: Vec<Option<CommitSig>>,
}

impl Commit {
    /// An empty commit, valid only before the first block.
    pub fn empty() -> Self {
        Self::default()
    }
}
