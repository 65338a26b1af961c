//! Key-value store abstraction.

use tessera_types::error::StoreError;

/// A persistent byte-keyed store.
///
/// Implementations must be safe for concurrent use; the core performs no
/// external locking around individual operations.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;
}
