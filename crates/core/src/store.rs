// crates/core/src/store.rs
//! The record-store seam between scrape jobs, the controller and export.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::forum::ForumId;

/// A single scraped record. The shape is owned by the forum's scrape job;
/// nothing outside the job looks inside.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Field a store injects into records it hands back from [`RecordStore::read_all`].
/// Exporters strip it.
pub const STORE_ID_FIELD: &str = "_id";

/// Append-only, forum-partitioned record collection.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Remove every record in the forum's partition. Returns how many were removed.
    async fn clear(&self, forum: ForumId) -> Result<u64, StoreError>;

    /// Append records to the forum's partition. Returns how many were written.
    async fn insert_many(&self, forum: ForumId, records: &[Record]) -> Result<u64, StoreError>;

    /// Every record in the partition, in insertion order, each carrying
    /// [`STORE_ID_FIELD`].
    async fn read_all(&self, forum: ForumId) -> Result<Vec<Record>, StoreError>;

    /// Reachability check for health reporting. Stores with no connection
    /// to lose keep the default.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-process store. Counts every call so callers can assert on access.
#[derive(Default)]
pub struct MemoryStore {
    partitions: Mutex<HashMap<ForumId, Vec<Record>>>,
    next_id: AtomicU64,
    operations: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `clear`/`insert_many`/`read_all` calls so far.
    pub fn operations(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    /// Number of records currently held for `forum`.
    pub fn len(&self, forum: ForumId) -> usize {
        self.partitions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&forum)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn clear(&self, forum: ForumId) -> Result<u64, StoreError> {
        self.operations.fetch_add(1, Ordering::Relaxed);
        let mut partitions = self.partitions.lock().unwrap_or_else(|e| e.into_inner());
        let removed = partitions.remove(&forum).map_or(0, |v| v.len());
        Ok(removed as u64)
    }

    async fn insert_many(&self, forum: ForumId, records: &[Record]) -> Result<u64, StoreError> {
        self.operations.fetch_add(1, Ordering::Relaxed);
        let mut partitions = self.partitions.lock().unwrap_or_else(|e| e.into_inner());
        let partition = partitions.entry(forum).or_default();
        for record in records {
            let mut stored = record.clone();
            let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            stored.insert(STORE_ID_FIELD.to_string(), serde_json::Value::from(id));
            partition.push(stored);
        }
        Ok(records.len() as u64)
    }

    async fn read_all(&self, forum: ForumId) -> Result<Vec<Record>, StoreError> {
        self.operations.fetch_add(1, Ordering::Relaxed);
        let partitions = self.partitions.lock().unwrap_or_else(|e| e.into_inner());
        Ok(partitions.get(&forum).cloned().unwrap_or_default())
    }
}
