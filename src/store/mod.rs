//! Ordered key-value store abstraction
//!
//! The crawl frontier and the extraction engine both depend only on this
//! trait: point reads and writes, existence checks, lexicographic prefix
//! iteration, and atomic multi-key batches. Two behaviorally identical
//! backends exist, one durable on disk and one ephemeral in memory.

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use crate::config::{StoreOptions, StoreStrategy};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record under key '{key}': {message}")]
    CorruptRecord { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A single write operation inside a batch
#[derive(Debug, Clone)]
enum Op {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// An ordered list of writes applied atomically by [`Store::apply`]
#[derive(Debug, Clone, Default)]
pub struct Batch {
    ops: Vec<Op>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an upsert of `key` to `value`
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(Op::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Stages a deletion of `key` (deleting an absent key is a no-op)
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(Op::Delete { key: key.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn into_ops(self) -> Vec<Op> {
        self.ops
    }
}

/// Trait for store backend implementations
///
/// Iteration yields keys in lexicographic byte order. Mutating the store
/// while one of its iterators is open is unsupported; running several
/// independent iterations concurrently is fine.
pub trait Store: Send + Sync {
    /// Reads the value under `key`, if present
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Upserts `value` under `key`
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Removes `key`; absent keys are ignored
    fn delete(&self, key: &[u8]) -> StoreResult<()>;

    /// Returns whether `key` is present
    fn contains(&self, key: &[u8]) -> StoreResult<bool>;

    /// Lazily iterates all `(key, value)` pairs whose key starts with
    /// `prefix`, in lexicographic key order
    fn iter_prefix(
        &self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = StoreResult<(Vec<u8>, Vec<u8>)>> + '_>;

    /// Applies every operation in `batch` atomically
    fn apply(&self, batch: Batch) -> StoreResult<()>;
}

/// Opens the store backend selected by the configuration
///
/// # Arguments
///
/// * `options` - Store options from the rug file (strategy + path)
///
/// # Returns
///
/// * `Ok(Arc<dyn Store>)` - The opened backend
/// * `Err(StoreError)` - The durable backend failed to open
pub fn open_store(options: &StoreOptions) -> StoreResult<Arc<dyn Store>> {
    match options.strategy {
        StoreStrategy::Disk => {
            let store = SledStore::open(&options.path)?;
            Ok(Arc::new(store))
        }
        StoreStrategy::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
