//! The block-commit event bus.
//!
//! The consensus engine publishes one [`CommittedTx`] per transaction when a
//! block is finalized. Commit-waiters subscribe *before* dispatching
//! admission, so a transaction that commits between admission and
//! subscription can never be missed. Dropping a [`CommitSubscription`]
//! releases it; there is no explicit unsubscribe call to forget.

use tessera_types::tx::{TxHash, TxResult};
use tokio::sync::broadcast;

/// A transaction observed in a finalized block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedTx {
    pub hash: TxHash,
    /// Height of the block that included the transaction.
    pub height: u64,
    /// The application's execution result for the transaction.
    pub result: TxResult,
}

/// Publish side of the commit event bus.
#[derive(Debug, Clone)]
pub struct CommitEvents {
    sender: broadcast::Sender<CommittedTx>,
}

impl CommitEvents {
    /// `capacity` bounds how far any subscriber may lag before it starts
    /// missing events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes a committed transaction. A send with no live subscribers is
    /// not an error; nobody was waiting.
    pub fn publish(&self, event: CommittedTx) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> CommitSubscription {
        CommitSubscription {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for CommitEvents {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A live subscription; dropped on every exit path of its holder.
pub struct CommitSubscription {
    receiver: broadcast::Receiver<CommittedTx>,
}

impl CommitSubscription {
    /// Receives the next event, or `None` once the bus has shut down.
    pub async fn recv(&mut self) -> Option<CommittedTx> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                // Lagging only drops older events; keep reading.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the event matching `hash`, skipping events for other
    /// transactions. Returns `None` if the bus shuts down first.
    pub async fn wait_for(&mut self, hash: &TxHash) -> Option<CommittedTx> {
        loop {
            match self.recv().await {
                Some(event) if event.hash == *hash => return Some(event),
                Some(_) => continue,
                None => return None,
            }
        }
    }
}
