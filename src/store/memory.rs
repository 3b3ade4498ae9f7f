//! Ephemeral store backend
//!
//! Keeps the whole keyspace in an ordered map guarded by a mutex. Used for
//! one-shot crawls and tests; behaviorally identical to the durable
//! backend, minus persistence.

use crate::store::{Batch, Op, Store, StoreResult};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Mutex;

/// In-memory store backend
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.map.lock().unwrap().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }

    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.map.lock().unwrap().contains_key(key))
    }

    fn iter_prefix(
        &self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = StoreResult<(Vec<u8>, Vec<u8>)>> + '_> {
        // Snapshot the matching range so the iterator does not hold the lock
        let map = self.map.lock().unwrap();
        let matches: Vec<(Vec<u8>, Vec<u8>)> = map
            .range((Bound::Included(prefix.to_vec()), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Box::new(matches.into_iter().map(Ok))
    }

    fn apply(&self, batch: Batch) -> StoreResult<()> {
        let mut map = self.map.lock().unwrap();
        for op in batch.into_ops() {
            match op {
                Op::Put { key, value } => {
                    map.insert(key, value);
                }
                Op::Delete { key } => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }
}
