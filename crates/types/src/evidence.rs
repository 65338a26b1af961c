//! Misbehavior evidence.
//!
//! Evidence is a verifiable claim that a validator violated protocol rules
//! at a past height. The only form currently defined is a duplicate vote:
//! two conflicting votes by the same validator for the same height and
//! round.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::EvidenceError;
use crate::validator::{address_from_pub_key, Address};
use crate::vote::Vote;

/// A signed claim that a validator misbehaved at some past height.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    DuplicateVote(DuplicateVoteEvidence),
}

impl Evidence {
    /// The height the misbehavior happened at.
    pub fn height(&self) -> u64 {
        match self {
            Self::DuplicateVote(e) => e.vote_a.height,
        }
    }

    /// The offending validator's address.
    pub fn address(&self) -> Address {
        match self {
            Self::DuplicateVote(e) => e.vote_a.validator_address,
        }
    }

    /// The validator's claimed positional index at [`Self::height`].
    pub fn index(&self) -> u32 {
        match self {
            Self::DuplicateVote(e) => e.vote_a.validator_index,
        }
    }

    /// Cryptographic self-verification against the chain id.
    ///
    /// Checks only what can be checked without historical state; membership
    /// of the accused validator at the claimed height is the verifier's job.
    pub fn verify(&self, chain_id: &str) -> Result<(), EvidenceError> {
        match self {
            Self::DuplicateVote(e) => e.verify(chain_id),
        }
    }
}

/// Proof that one validator signed two different blocks at the same height
/// and round.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DuplicateVoteEvidence {
    /// Public key of the offending validator.
    pub pub_key: [u8; 32],
    pub vote_a: Vote,
    pub vote_b: Vote,
}

impl DuplicateVoteEvidence {
    fn verify(&self, chain_id: &str) -> Result<(), EvidenceError> {
        let (a, b) = (&self.vote_a, &self.vote_b);
        if a.height != b.height || a.round != b.round {
            return Err(EvidenceError::InvalidSignature(
                "votes are for different heights or rounds".into(),
            ));
        }
        if a.validator_address != b.validator_address || a.validator_index != b.validator_index {
            return Err(EvidenceError::InvalidSignature(
                "votes are from different validators".into(),
            ));
        }
        if a.block_id == b.block_id {
            return Err(EvidenceError::InvalidSignature(
                "votes do not conflict: same block id".into(),
            ));
        }
        if a.validator_address != address_from_pub_key(&self.pub_key) {
            return Err(EvidenceError::InvalidSignature(
                "vote address does not match the public key".into(),
            ));
        }
        a.verify(chain_id, &self.pub_key)
            .map_err(EvidenceError::InvalidSignature)?;
        b.verify(chain_id, &self.pub_key)
            .map_err(EvidenceError::InvalidSignature)?;
        Ok(())
    }
}
