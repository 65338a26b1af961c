//! Node readiness flags.

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether the node may accept transaction submissions.
///
/// Submissions require the node to have finished startup and not be
/// fast-syncing; both flags are flipped by the bootstrap and block-sync
/// paths outside this crate.
#[derive(Debug, Default)]
pub struct NodeStatus {
    ready: AtomicBool,
    fast_sync: AtomicBool,
}

impl NodeStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn set_fast_sync(&self, syncing: bool) {
        self.fast_sync.store(syncing, Ordering::SeqCst);
    }

    pub fn is_fast_syncing(&self) -> bool {
        self.fast_sync.load(Ordering::SeqCst)
    }
}
