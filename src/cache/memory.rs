//! Process-local partition store

use crate::cache::key::CacheKey;
use crate::cache::store::{PartitionStore, PartitionTable};
use crate::error::PrecacheResult;
use crate::net::Response;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Partition store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<PartitionTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PartitionStore for MemoryStore {
    async fn create(&self, name: &str) -> PrecacheResult<()> {
        self.table.write().await.open(name);
        Ok(())
    }

    async fn get(&self, name: &str, key: &CacheKey) -> PrecacheResult<Option<Response>> {
        let table = self.table.read().await;
        Ok(table.find(name).and_then(|p| p.entries.get(key)).cloned())
    }

    async fn put(&self, name: &str, key: CacheKey, response: Response) -> PrecacheResult<()> {
        self.table.write().await.open(name).entries.insert(key, response);
        Ok(())
    }

    async fn put_all(
        &self,
        name: &str,
        entries: Vec<(CacheKey, Response)>,
    ) -> PrecacheResult<()> {
        self.table.write().await.open(name).entries.extend(entries);
        Ok(())
    }

    async fn match_any(&self, key: &CacheKey) -> PrecacheResult<Option<Response>> {
        Ok(self.table.read().await.match_any(key).cloned())
    }

    async fn names(&self) -> PrecacheResult<Vec<String>> {
        Ok(self.table.read().await.names())
    }

    async fn entries(&self, name: &str) -> PrecacheResult<Option<Vec<(CacheKey, Response)>>> {
        Ok(self.table.read().await.find(name).map(|p| p.snapshot()))
    }

    async fn delete(&self, name: &str) -> PrecacheResult<bool> {
        Ok(self.table.write().await.remove(name).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
