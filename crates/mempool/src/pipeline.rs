//! The transaction submission pipeline.
//!
//! Every entry point computes the transaction's content hash, records a
//! pending cache entry, and dispatches one background admission check whose
//! result is delivered through a single-slot channel exactly once. The
//! entry points differ only in how long they wait: not at all, until
//! admission, or until commit (bounded by a timeout).

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tessera_api::app::AppConnection;
use tessera_types::error::MempoolError;
use tessera_types::tx::{Tx, TxHash, TxResult};
use tokio::sync::oneshot;
use tokio::time;
use tracing::{debug, error};

use crate::events::{CommitEvents, CommittedTx};
use crate::status::NodeStatus;

/// Tuning knobs for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How long `submit_and_await_commit` waits for inclusion in a block.
    pub commit_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            commit_timeout: Duration::from_secs(120),
        }
    }
}

/// Response of [`TxPipeline::submit_sync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSyncResponse {
    pub hash: TxHash,
    pub check: TxResult,
}

/// Response of [`TxPipeline::submit_and_await_commit`].
///
/// `commit` is `None` when admission returned a non-OK code; that is a
/// reported outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxCommitResponse {
    pub hash: TxHash,
    pub check: TxResult,
    pub commit: Option<CommittedTx>,
}

struct PendingTx {
    tx: Tx,
    /// `None` while the admission check is in flight.
    check: Option<TxResult>,
}

/// Carries submitted transactions from ingress to inclusion.
pub struct TxPipeline {
    app: Arc<dyn AppConnection>,
    status: Arc<NodeStatus>,
    events: CommitEvents,
    cache: Arc<DashMap<TxHash, PendingTx>>,
    commit_timeout: Duration,
}

impl TxPipeline {
    /// Builds the pipeline and spawns the cache janitor; must be called
    /// inside a tokio runtime.
    pub fn new(
        app: Arc<dyn AppConnection>,
        status: Arc<NodeStatus>,
        events: CommitEvents,
        config: PipelineConfig,
    ) -> Self {
        let cache: Arc<DashMap<TxHash, PendingTx>> = Arc::new(DashMap::new());

        // Committed transactions leave the cache; the task ends on its own
        // once the event bus shuts down.
        let janitor_cache = Arc::clone(&cache);
        let mut commits = events.subscribe();
        tokio::spawn(async move {
            while let Some(event) = commits.recv().await {
                if janitor_cache.remove(&event.hash).is_some() {
                    debug!(
                        target: "mempool",
                        tx = %event.hash,
                        height = event.height,
                        "transaction committed"
                    );
                }
            }
        });

        Self {
            app,
            status,
            events,
            cache,
            commit_timeout: config.commit_timeout,
        }
    }

    /// Fire-and-forget submission: returns the content hash immediately; the
    /// caller receives no admission outcome.
    pub fn submit_async(&self, tx: Tx) -> Result<TxHash, MempoolError> {
        let hash = self.admit_new(&tx)?;
        let _ = self.dispatch(hash, tx);
        Ok(hash)
    }

    /// Blocks the calling task until the admission check resolves.
    pub async fn submit_sync(&self, tx: Tx) -> Result<TxSyncResponse, MempoolError> {
        let hash = self.admit_new(&tx)?;
        let check = self.await_admission(self.dispatch(hash, tx)).await?;
        Ok(TxSyncResponse { hash, check })
    }

    /// Blocks until the transaction is observed in a committed block, or the
    /// commit timeout elapses.
    ///
    /// The commit subscription is taken *before* admission is dispatched, so
    /// a transaction committing between admission and subscription cannot be
    /// missed; it is released on every exit path when the guard drops.
    pub async fn submit_and_await_commit(
        &self,
        tx: Tx,
    ) -> Result<TxCommitResponse, MempoolError> {
        let hash = self.admit_new(&tx)?;
        let mut commits = self.events.subscribe();

        let check = self.await_admission(self.dispatch(hash, tx)).await?;
        if !check.ok() {
            // A rejected transaction will never commit; report the check
            // result as-is.
            return Ok(TxCommitResponse {
                hash,
                check,
                commit: None,
            });
        }

        match time::timeout(self.commit_timeout, commits.wait_for(&hash)).await {
            Ok(Some(event)) => Ok(TxCommitResponse {
                hash,
                check,
                commit: Some(event),
            }),
            Ok(None) => Err(MempoolError::SubscriptionClosed(hash)),
            Err(_) => {
                error!(
                    target: "mempool",
                    tx = %hash,
                    "timed out waiting for transaction to be included in a block"
                );
                Err(MempoolError::CommitTimeout { hash, check })
            }
        }
    }

    /// Transactions admitted but not yet observed in a committed block.
    ///
    /// Like the submission paths, refused until the node has finished
    /// starting up.
    pub fn unconfirmed_txs(&self) -> Result<Vec<Tx>, MempoolError> {
        if !self.status.is_ready() {
            return Err(MempoolError::NotReady);
        }
        Ok(self
            .cache
            .iter()
            .filter(|entry| matches!(&entry.check, Some(r) if r.ok()))
            .map(|entry| entry.tx.clone())
            .collect())
    }

    pub fn num_unconfirmed_txs(&self) -> Result<usize, MempoolError> {
        if !self.status.is_ready() {
            return Err(MempoolError::NotReady);
        }
        Ok(self
            .cache
            .iter()
            .filter(|entry| matches!(&entry.check, Some(r) if r.ok()))
            .count())
    }

    /// Admission status for a tracked transaction: `None` if unknown,
    /// `Some(None)` while pending, `Some(Some(_))` once decided.
    pub fn admission_result(&self, hash: &TxHash) -> Option<Option<TxResult>> {
        self.cache.get(hash).map(|entry| entry.check.clone())
    }

    /// Gates the submission and claims the cache slot for its hash.
    ///
    /// The pending entry is inserted through the map's entry API, so two
    /// racing submissions of the same transaction can never both pass the
    /// duplicate guard: exactly one claims the slot, the other is refused.
    fn admit_new(&self, tx: &Tx) -> Result<TxHash, MempoolError> {
        if !self.status.is_ready() {
            return Err(MempoolError::NotReady);
        }
        if self.status.is_fast_syncing() {
            debug!(target: "mempool", "fast sync in progress, rejecting submission");
            return Err(MempoolError::Syncing);
        }
        let hash = TxHash::of(tx);
        match self.cache.entry(hash) {
            Entry::Occupied(_) => Err(MempoolError::Duplicate(hash)),
            Entry::Vacant(slot) => {
                slot.insert(PendingTx {
                    tx: tx.clone(),
                    check: None,
                });
                Ok(hash)
            }
        }
    }

    /// Spawns the admission check for a claimed cache slot. The returned
    /// slot resolves exactly once; dropping it is how `submit_async` opts
    /// out of the outcome.
    fn dispatch(&self, hash: TxHash, tx: Tx) -> oneshot::Receiver<Result<TxResult, MempoolError>> {
        let (slot, receiver) = oneshot::channel();
        let app = Arc::clone(&self.app);
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            let outcome = match app.check_admission(&tx).await {
                Ok(result) => {
                    if result.ok() {
                        if let Some(mut entry) = cache.get_mut(&hash) {
                            entry.check = Some(result.clone());
                        }
                    } else {
                        // A rejected transaction's lifetime ends here.
                        cache.remove(&hash);
                    }
                    Ok(result)
                }
                Err(e) => {
                    error!(target: "mempool", tx = %hash, "admission check failed: {e}");
                    cache.remove(&hash);
                    Err(MempoolError::Admission(e.to_string()))
                }
            };
            // An absent receiver just means nobody was waiting.
            let _ = slot.send(outcome);
        });
        receiver
    }

    async fn await_admission(
        &self,
        slot: oneshot::Receiver<Result<TxResult, MempoolError>>,
    ) -> Result<TxResult, MempoolError> {
        slot.await
            .map_err(|_| MempoolError::Admission("admission task dropped its result".into()))?
    }
}
