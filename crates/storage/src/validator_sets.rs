//! Per-height validator-set records.

use std::sync::Arc;

use tessera_api::store::KvStore;
use tessera_api::validators::ValidatorSetView;
use tessera_types::codec;
use tessera_types::error::{FatalError, StoreError};
use tessera_types::validator::ValidatorSet;
use tracing::debug;

use crate::keys::validator_set_key;

/// Validator-set history backed by the key-value store.
///
/// Records are immutable once written for a height; retention policy may
/// prune old heights, after which lookups return `None`.
pub struct StoredValidatorSets {
    db: Arc<dyn KvStore>,
}

impl StoredValidatorSets {
    pub fn new(db: Arc<dyn KvStore>) -> Self {
        Self { db }
    }

    /// Records the set effective at `height`.
    pub fn save(&self, height: u64, set: &ValidatorSet) -> Result<(), StoreError> {
        self.db
            .put(&validator_set_key(height), &codec::to_bytes_canonical(set))
    }

    /// Drops the record for `height`, as the retention policy does.
    pub fn prune(&self, height: u64) -> Result<(), StoreError> {
        debug!(target: "storage", height, "pruning validator set record");
        self.db.delete(&validator_set_key(height))
    }
}

impl ValidatorSetView for StoredValidatorSets {
    fn validators_at(&self, height: u64) -> Result<Option<ValidatorSet>, FatalError> {
        match self
            .db
            .get(&validator_set_key(height))
            .map_err(FatalError::from)?
        {
            None => Ok(None),
            Some(bytes) => codec::from_bytes_canonical(&bytes).map(Some).map_err(|e| {
                FatalError::Corrupt(format!("validator set at height {height}: {e}"))
            }),
        }
    }
}
