//! Persistent storage for the Tessera node core.
//!
//! A single `redb` database holds everything under one byte-keyed table; the
//! key layout lives in [`keys`]. An in-memory store backs tests.

pub mod block_store;
pub mod keys;
pub mod kv;
pub mod validator_sets;

pub use block_store::BlockStoreState;
pub use kv::{MemStore, RedbStore};
pub use validator_sets::StoredValidatorSets;
