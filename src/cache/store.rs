//! Partition store abstraction
//!
//! A store holds any number of named partitions, each mapping a
//! [`CacheKey`] to a [`Response`]. Partitions are created on open, entries
//! are overwritten on put and never patched, and whole partitions are
//! removed with delete.

use crate::cache::key::CacheKey;
use crate::error::PrecacheResult;
use crate::net::Response;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Abstract partition store
///
/// Implementations must make a completed `put` visible to every later
/// `get`/`match_any` in the process. Concurrent puts to the same key may
/// land in either order.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Create the partition if it does not exist yet
    async fn create(&self, name: &str) -> PrecacheResult<()>;

    /// Look a key up in one partition; a missing partition is a miss
    async fn get(&self, name: &str, key: &CacheKey) -> PrecacheResult<Option<Response>>;

    /// Store a response, creating the partition if needed
    async fn put(&self, name: &str, key: CacheKey, response: Response) -> PrecacheResult<()>;

    /// Store a batch of responses as one write
    async fn put_all(&self, name: &str, entries: Vec<(CacheKey, Response)>)
        -> PrecacheResult<()>;

    /// Look a key up across all partitions, oldest partition first
    async fn match_any(&self, key: &CacheKey) -> PrecacheResult<Option<Response>>;

    /// All partition names, in creation order
    async fn names(&self) -> PrecacheResult<Vec<String>>;

    /// Snapshot of one partition's entries, or `None` if it does not exist
    async fn entries(&self, name: &str) -> PrecacheResult<Option<Vec<(CacheKey, Response)>>>;

    /// Remove a partition; returns whether it existed
    async fn delete(&self, name: &str) -> PrecacheResult<bool>;

    /// Human-readable backend name
    fn backend_name(&self) -> &'static str;
}

/// Handle to one named partition
#[derive(Clone)]
pub struct Partition {
    store: Arc<dyn PartitionStore>,
    name: String,
}

impl Partition {
    /// Open a partition, creating it if needed
    pub async fn open(store: Arc<dyn PartitionStore>, name: &str) -> PrecacheResult<Self> {
        store.create(name).await?;
        Ok(Self {
            store,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get(&self, key: &CacheKey) -> PrecacheResult<Option<Response>> {
        self.store.get(&self.name, key).await
    }

    pub async fn put(&self, key: CacheKey, response: Response) -> PrecacheResult<()> {
        self.store.put(&self.name, key, response).await
    }

    pub async fn put_all(&self, entries: Vec<(CacheKey, Response)>) -> PrecacheResult<()> {
        self.store.put_all(&self.name, entries).await
    }

    pub async fn len(&self) -> PrecacheResult<usize> {
        Ok(self
            .store
            .entries(&self.name)
            .await?
            .map(|e| e.len())
            .unwrap_or(0))
    }

    pub async fn is_empty(&self) -> PrecacheResult<bool> {
        Ok(self.len().await? == 0)
    }
}

/// In-memory contents of one partition
#[derive(Debug, Clone)]
pub(crate) struct PartitionData {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub entries: HashMap<CacheKey, Response>,
}

impl PartitionData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created_at: Utc::now(),
            entries: HashMap::new(),
        }
    }

    pub fn snapshot(&self) -> Vec<(CacheKey, Response)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| {
            (&a.0.url, a.0.method.as_str()).cmp(&(&b.0.url, b.0.method.as_str()))
        });
        entries
    }
}

/// Ordered set of partitions shared by the store backends
#[derive(Debug, Default)]
pub(crate) struct PartitionTable {
    partitions: Vec<PartitionData>,
}

impl PartitionTable {
    pub fn from_partitions(mut partitions: Vec<PartitionData>) -> Self {
        partitions.sort_by(|a, b| (a.created_at, &a.name).cmp(&(b.created_at, &b.name)));
        Self { partitions }
    }

    pub fn find(&self, name: &str) -> Option<&PartitionData> {
        self.partitions.iter().find(|p| p.name == name)
    }

    /// Partition by name, created (appended last) when missing
    pub fn open(&mut self, name: &str) -> &mut PartitionData {
        let idx = match self.partitions.iter().position(|p| p.name == name) {
            Some(idx) => idx,
            None => {
                self.partitions.push(PartitionData::new(name));
                self.partitions.len() - 1
            }
        };
        &mut self.partitions[idx]
    }

    /// Replace the partition with the same name, or append it
    pub fn commit(&mut self, data: PartitionData) {
        match self.partitions.iter_mut().find(|p| p.name == data.name) {
            Some(slot) => *slot = data,
            None => self.partitions.push(data),
        }
    }

    pub fn match_any(&self, key: &CacheKey) -> Option<&Response> {
        self.partitions.iter().find_map(|p| p.entries.get(key))
    }

    pub fn names(&self) -> Vec<String> {
        self.partitions.iter().map(|p| p.name.clone()).collect()
    }

    pub fn remove(&mut self, name: &str) -> Option<PartitionData> {
        let idx = self.partitions.iter().position(|p| p.name == name)?;
        Some(self.partitions.remove(idx))
    }
}
