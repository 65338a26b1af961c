//! Key-value store backends.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use redb::{Database, ReadableTable, TableDefinition};
use tessera_api::store::KvStore;
use tessera_types::error::StoreError;

const KV: TableDefinition<&[u8], &[u8]> = TableDefinition::new("KV");

fn backend<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Production store backed by a single `redb` database file.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(backend)?;
        // Materialize the table so readers never race its creation.
        let wtx = db.begin_write().map_err(backend)?;
        wtx.open_table(KV).map_err(backend)?;
        wtx.commit().map_err(backend)?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl KvStore for RedbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtx = self.db.begin_read().map_err(backend)?;
        let table = rtx.open_table(KV).map_err(backend)?;
        let value = table.get(key).map_err(backend)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let wtx = self.db.begin_write().map_err(backend)?;
        {
            let mut table = wtx.open_table(KV).map_err(backend)?;
            table.insert(key, value).map_err(backend)?;
        }
        wtx.commit().map_err(backend)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let wtx = self.db.begin_write().map_err(backend)?;
        {
            let mut table = wtx.open_table(KV).map_err(backend)?;
            table.remove(key).map_err(backend)?;
        }
        wtx.commit().map_err(backend)
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.read().map_err(backend)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(backend)?;
        entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(backend)?;
        entries.remove(key);
        Ok(())
    }
}
