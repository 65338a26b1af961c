//! Validators and per-height validator sets.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::block::BlockId;
use crate::error::BlockError;
use crate::hash::{self, hash_of, Hash};
use crate::vote::{self, Commit};

/// A validator address, derived from its public key.
pub type Address = [u8; 32];

/// Derives the address for an ed25519 public key.
pub fn address_from_pub_key(pub_key: &[u8; 32]) -> Address {
    hash::sha256(pub_key)
}

/// A single consensus validator.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    pub address: Address,
    /// Raw ed25519 public key.
    pub pub_key: [u8; 32],
    /// Voting power.
    pub power: u64,
}

/// The ordered, de-duplicated set of validators eligible to sign at a height.
///
/// **Invariant:** validators are kept sorted by address. The constructor
/// enforces this, so positional indices are stable across nodes for the same
/// membership; commits are aligned positionally with this order.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
}

impl ValidatorSet {
    /// Builds a set, sorting by address and dropping duplicate addresses.
    pub fn new(mut validators: Vec<Validator>) -> Self {
        validators.sort_by(|a, b| a.address.cmp(&b.address));
        validators.dedup_by(|a, b| a.address == b.address);
        Self { validators }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Canonical digest of the membership.
    pub fn hash(&self) -> Hash {
        hash_of(&self.validators)
    }

    /// Total voting power. Widened to avoid overflow when summing.
    pub fn total_power(&self) -> u128 {
        self.validators.iter().map(|v| v.power as u128).sum()
    }

    /// Positional lookup by address.
    pub fn get_by_address(&self, address: &Address) -> Option<(usize, &Validator)> {
        self.validators
            .iter()
            .enumerate()
            .find(|(_, v)| v.address == *address)
    }

    /// Verifies an aggregated commit for `block_id` at `height` against this
    /// set.
    ///
    /// The entry count must equal the set size (checked before any signature
    /// work), every present signature must verify, and the signers must
    /// carry more than 2/3 of the total voting power.
    pub fn verify_commit(
        &self,
        chain_id: &str,
        block_id: &BlockId,
        height: u64,
        commit: &Commit,
    ) -> Result<(), BlockError> {
        if commit.signatures.len() != self.len() {
            return Err(BlockError::CommitSizeMismatch {
                expected: self.len(),
                got: commit.signatures.len(),
            });
        }
        if commit.height != height {
            return Err(BlockError::CommitSignature(format!(
                "commit is for height {}, expected {}",
                commit.height, height
            )));
        }
        if commit.block_id != *block_id {
            return Err(BlockError::CommitSignature(format!(
                "commit is for block {}, expected {}",
                commit.block_id, block_id
            )));
        }

        let mut signed_power: u128 = 0;
        for (validator, entry) in self.validators.iter().zip(commit.signatures.iter()) {
            let Some(sig) = entry else {
                continue;
            };
            if sig.validator_address != validator.address {
                return Err(BlockError::CommitSignature(format!(
                    "signature entry for {} is misaligned with validator {}",
                    hex::encode(sig.validator_address),
                    hex::encode(validator.address),
                )));
            }
            let key = VerifyingKey::from_bytes(&validator.pub_key)
                .map_err(|e| BlockError::CommitSignature(format!("bad public key: {e}")))?;
            let signature = Signature::from_slice(&sig.signature)
                .map_err(|e| BlockError::CommitSignature(format!("bad signature encoding: {e}")))?;
            let msg = vote::sign_bytes(chain_id, height, commit.round, &commit.block_id.hash);
            key.verify(&msg, &signature).map_err(|e| {
                BlockError::CommitSignature(format!(
                    "signature by {} does not verify: {e}",
                    hex::encode(validator.address)
                ))
            })?;
            signed_power += validator.power as u128;
        }

        let total = self.total_power();
        if signed_power * 3 <= total * 2 {
            return Err(BlockError::CommitSignature(format!(
                "insufficient voting power: signed {signed_power}, total {total}"
            )));
        }
        Ok(())
    }
}
