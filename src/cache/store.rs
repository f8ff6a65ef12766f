//! Partition Store Module
//!
//! Name-addressed set of cache partitions. The [`PartitionStore`] trait is the
//! seam the worker talks to; [`MemoryPartitionStore`] is the in-process
//! implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::cache::{CacheKey, CacheStats, CapturedResponse};

// == Store Error ==
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Partition name cannot be empty")]
    EmptyPartitionName,

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

// == Partition Store Trait ==
/// Async capability over named cache partitions.
///
/// Every operation is atomic on its own: a write replaces one entry, a delete
/// drops one whole partition. There are no multi-operation transactions.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Creates the partition if it does not exist.
    async fn open(&self, partition: &str) -> Result<(), StoreError>;

    /// Looks up `key` in one partition. Missing partitions are misses.
    async fn lookup(&self, partition: &str, key: &CacheKey) -> Option<CapturedResponse>;

    /// Looks up `key` in each partition in order, returning the first hit.
    async fn lookup_any(&self, partitions: &[&str], key: &CacheKey) -> Option<CapturedResponse>;

    /// Writes an entry, creating the partition on first write.
    async fn put(
        &self,
        partition: &str,
        key: CacheKey,
        response: CapturedResponse,
    ) -> Result<(), StoreError>;

    /// Deletes a whole partition. Returns false if it did not exist.
    async fn delete(&self, partition: &str) -> bool;

    /// Existing partition names in creation order.
    async fn partition_names(&self) -> Vec<String>;

    /// Number of entries in a partition, or None if it does not exist.
    async fn len(&self, partition: &str) -> Option<usize>;

    async fn stats(&self) -> CacheStats;
}

// == Memory Store ==
#[derive(Debug)]
struct Partition {
    name: String,
    entries: BTreeMap<CacheKey, CapturedResponse>,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Partitions in creation order
    partitions: Vec<Partition>,
    stats: CacheStats,
}

impl StoreInner {
    fn find(&self, name: &str) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.name == name)
    }

    fn find_or_create(&mut self, name: &str) -> &mut Partition {
        let index = match self.partitions.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.partitions.push(Partition {
                    name: name.to_string(),
                    entries: BTreeMap::new(),
                });
                self.partitions.len() - 1
            }
        };
        &mut self.partitions[index]
    }

    fn total_entries(&self) -> usize {
        self.partitions.iter().map(|p| p.entries.len()).sum()
    }
}

/// In-memory partition store guarded by a single async RwLock.
#[derive(Debug, Default)]
pub struct MemoryPartitionStore {
    inner: RwLock<StoreInner>,
}

impl MemoryPartitionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PartitionStore for MemoryPartitionStore {
    async fn open(&self, partition: &str) -> Result<(), StoreError> {
        if partition.is_empty() {
            return Err(StoreError::EmptyPartitionName);
        }
        self.inner.write().await.find_or_create(partition);
        Ok(())
    }

    async fn lookup(&self, partition: &str, key: &CacheKey) -> Option<CapturedResponse> {
        self.lookup_any(&[partition], key).await
    }

    async fn lookup_any(&self, partitions: &[&str], key: &CacheKey) -> Option<CapturedResponse> {
        // Write lock: stats are updated on every lookup
        let mut inner = self.inner.write().await;
        let found = partitions
            .iter()
            .filter_map(|name| inner.find(name))
            .find_map(|p| p.entries.get(key).cloned());

        match found {
            Some(_) => inner.stats.record_hit(),
            None => inner.stats.record_miss(),
        }
        found
    }

    async fn put(
        &self,
        partition: &str,
        key: CacheKey,
        response: CapturedResponse,
    ) -> Result<(), StoreError> {
        if partition.is_empty() {
            return Err(StoreError::EmptyPartitionName);
        }

        let mut inner = self.inner.write().await;
        inner.find_or_create(partition).entries.insert(key, response);
        inner.stats.record_write();
        let total = inner.total_entries();
        inner.stats.set_total_entries(total);
        Ok(())
    }

    async fn delete(&self, partition: &str) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.partitions.len();
        inner.partitions.retain(|p| p.name != partition);
        let removed = inner.partitions.len() != before;

        if removed {
            inner.stats.record_partition_deleted();
            let total = inner.total_entries();
            inner.stats.set_total_entries(total);
        }
        removed
    }

    async fn partition_names(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        inner.partitions.iter().map(|p| p.name.clone()).collect()
    }

    async fn len(&self, partition: &str) -> Option<usize> {
        let inner = self.inner.read().await;
        inner.find(partition).map(|p| p.entries.len())
    }

    async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.total_entries());
        stats
    }
}
