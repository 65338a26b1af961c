//! The committed block-store height marker.
//!
//! A single JSON record under a fixed key. The normal commit path increments
//! it after persisting a block; rollback decrements it by exactly one.

use serde::{Deserialize, Serialize};
use tessera_api::store::KvStore;
use tessera_types::error::FatalError;
use tracing::debug;

use crate::keys::BLOCK_STORE_KEY;

/// Durable record of the committed block-store height.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStoreState {
    pub height: u64,
}

impl BlockStoreState {
    /// Loads the marker, returning the zero value if none was ever
    /// persisted.
    ///
    /// A marker that exists but does not decode is corruption, not a fresh
    /// store, and is therefore fatal.
    pub fn load(db: &dyn KvStore) -> Result<Self, FatalError> {
        match db.get(BLOCK_STORE_KEY).map_err(FatalError::from)? {
            None => Ok(Self { height: 0 }),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| FatalError::Corrupt(format!("block store marker: {e}"))),
        }
    }

    /// Persists the marker.
    pub fn save(&self, db: &dyn KvStore) -> Result<(), FatalError> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| FatalError::Store(format!("block store marker: {e}")))?;
        db.put(BLOCK_STORE_KEY, &bytes).map_err(FatalError::from)?;
        debug!(target: "storage", height = self.height, "saved block store marker");
        Ok(())
    }
}
