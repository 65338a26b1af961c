//! The rollback protocol.
//!
//! An app-hash mismatch means the application's execution and the consensus
//! layer's bookkeeping have drifted by exactly one block. The only safe
//! recovery is to make both layers agree they are one block behind and let
//! normal sync re-deliver the block. The three steps below have no
//! partial-success path: any failure is fatal and the caller must halt the
//! process.

use std::sync::Arc;

use tessera_api::app::AppConnection;
use tessera_api::store::KvStore;
use tessera_storage::block_store::BlockStoreState;
use tessera_types::error::FatalError;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::chain_state::StateStore;

/// Reverts the application by one height and re-synchronizes local
/// bookkeeping.
pub struct RollbackCoordinator {
    app: Arc<dyn AppConnection>,
    state_store: StateStore,
    db: Arc<dyn KvStore>,
    /// Height of a mismatch we already rolled back for, cleared by the next
    /// successful validation. A second mismatch before recovery would loop
    /// forever, so it is refused as fatal.
    pending_mismatch: Mutex<Option<u64>>,
}

impl RollbackCoordinator {
    pub fn new(app: Arc<dyn AppConnection>, state_store: StateStore, db: Arc<dyn KvStore>) -> Self {
        Self {
            app,
            state_store,
            db,
            pending_mismatch: Mutex::new(None),
        }
    }

    /// Runs the rollback for a mismatch detected at `mismatch_height` (the
    /// last committed height at detection time).
    pub async fn rollback(&self, mismatch_height: u64) -> Result<(), FatalError> {
        {
            let mut pending = self.pending_mismatch.lock().await;
            if let Some(previous) = *pending {
                warn!(
                    target: "state",
                    previous, mismatch_height,
                    "app hash mismatch before recovery from the last one"
                );
                return Err(FatalError::RepeatedAppHashMismatch {
                    height: mismatch_height,
                });
            }
            *pending = Some(mismatch_height);
        }

        info!(target: "state", height = mismatch_height, "rolling back one height");

        // Step 1: the application reverts its own state.
        let ack = self
            .app
            .rollback_one_height()
            .await
            .map_err(|e| FatalError::App(e.to_string()))?;
        if !ack.ok() {
            return Err(FatalError::AppRollback {
                code: ack.code,
                log: ack.log,
            });
        }

        // Step 2: re-assert the last durably-saved snapshot as current. This
        // is a pure re-assertion; the snapshot already exists from the
        // previous successful commit.
        let snapshot = self
            .state_store
            .load_snapshot()?
            .ok_or(FatalError::MissingSnapshot)?;
        self.state_store.save_current(&snapshot)?;

        // Step 3: decrement the block-store marker by exactly one.
        let mut marker = BlockStoreState::load(self.db.as_ref())?;
        if marker.height == 0 {
            return Err(FatalError::Corrupt(
                "block store height is already zero; nothing to roll back".into(),
            ));
        }
        marker.height -= 1;
        marker.save(self.db.as_ref())?;

        info!(
            target: "state",
            store_height = marker.height,
            state_height = snapshot.last_height,
            "rollback complete"
        );
        Ok(())
    }

    /// Marks the node recovered; called after a fully successful validation.
    pub(crate) async fn note_validation_success(&self) {
        *self.pending_mismatch.lock().await = None;
    }
}
