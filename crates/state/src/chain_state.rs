//! The locally persisted consensus-layer view of the chain.

use std::sync::Arc;

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use tessera_api::store::KvStore;
use tessera_storage::keys::{CHAIN_STATE_KEY, CHAIN_STATE_SNAPSHOT_KEY};
use tessera_types::block::BlockId;
use tessera_types::codec;
use tessera_types::error::FatalError;
use tessera_types::hash::Hash;
use tessera_types::params::ConsensusParams;
use tessera_types::validator::ValidatorSet;

/// State of the chain after the last committed block.
///
/// Exactly one authoritative instance exists per node. It is mutated only by
/// the commit path after a block passes validation; validation itself only
/// reads it.
#[derive(Encode, Decode, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChainState {
    pub chain_id: String,
    pub last_height: u64,
    pub last_block_id: BlockId,
    /// Cumulative transaction count up to and including the last block.
    pub last_total_txs: u64,
    /// Application state digest after executing the last block.
    pub last_app_hash: Hash,
    /// Digest of the last block's execution results.
    pub last_results_hash: Hash,
    pub consensus_params: ConsensusParams,
    /// Validator set signing the next block.
    pub validators: ValidatorSet,
    /// Validator set that signed the last block.
    pub last_validators: ValidatorSet,
}

impl ChainState {
    /// Pre-genesis state for a fresh chain.
    pub fn genesis(chain_id: impl Into<String>, validators: ValidatorSet) -> Self {
        Self {
            chain_id: chain_id.into(),
            last_height: 0,
            last_block_id: BlockId::default(),
            last_total_txs: 0,
            last_app_hash: [0u8; 32],
            last_results_hash: [0u8; 32],
            consensus_params: ConsensusParams::default(),
            validators,
            last_validators: ValidatorSet::default(),
        }
    }
}

/// Persistence for [`ChainState`].
///
/// Two records: the current state, and the snapshot the commit path writes
/// after every successful commit. Rollback re-asserts the snapshot as
/// current; it never computes a new state.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<dyn KvStore>,
}

impl StateStore {
    pub fn new(db: Arc<dyn KvStore>) -> Self {
        Self { db }
    }

    pub fn save_current(&self, state: &ChainState) -> Result<(), FatalError> {
        self.db
            .put(CHAIN_STATE_KEY, &codec::to_bytes_canonical(state))
            .map_err(FatalError::from)
    }

    pub fn load_current(&self) -> Result<Option<ChainState>, FatalError> {
        self.load(CHAIN_STATE_KEY)
    }

    pub fn save_snapshot(&self, state: &ChainState) -> Result<(), FatalError> {
        self.db
            .put(CHAIN_STATE_SNAPSHOT_KEY, &codec::to_bytes_canonical(state))
            .map_err(FatalError::from)
    }

    pub fn load_snapshot(&self) -> Result<Option<ChainState>, FatalError> {
        self.load(CHAIN_STATE_SNAPSHOT_KEY)
    }

    fn load(&self, key: &[u8]) -> Result<Option<ChainState>, FatalError> {
        match self.db.get(key).map_err(FatalError::from)? {
            None => Ok(None),
            Some(bytes) => codec::from_bytes_canonical(&bytes)
                .map(Some)
                .map_err(|e| FatalError::Corrupt(format!("chain state: {e}"))),
        }
    }
}
