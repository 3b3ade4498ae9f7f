//! Durable store backend on sled
//!
//! The database lives in a directory on disk; everything written here
//! survives a crash and is picked up again on the next run.

use crate::store::{Batch, Op, Store, StoreResult};
use std::path::Path;

/// Store backend persisting to a sled database directory
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Opens (or creates) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl Store for SledStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|value| value.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.db.remove(key)?;
        Ok(())
    }

    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.db.contains_key(key)?)
    }

    fn iter_prefix(
        &self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = StoreResult<(Vec<u8>, Vec<u8>)>> + '_> {
        Box::new(self.db.scan_prefix(prefix).map(|item| {
            let (key, value) = item?;
            Ok((key.to_vec(), value.to_vec()))
        }))
    }

    fn apply(&self, batch: Batch) -> StoreResult<()> {
        let mut staged = sled::Batch::default();
        for op in batch.into_ops() {
            match op {
                Op::Put { key, value } => staged.insert(key, value),
                Op::Delete { key } => staged.remove(key),
            }
        }
        self.db.apply_batch(staged)?;
        Ok(())
    }
}

impl Drop for SledStore {
    fn drop(&mut self) {
        let _ = self.db.flush();
    }
}
