//! Disk-backed partition store
//!
//! Each partition is one JSON document under the store directory, named by
//! the first 12 hex characters of the SHA-256 of the partition name. The
//! whole table is loaded on open. A mutation is applied to a copy of the
//! partition, written out (temp file, then rename) and only then committed
//! to the in-memory table, so a failed write leaves both sides unchanged.

use crate::cache::key::CacheKey;
use crate::cache::store::{PartitionData, PartitionStore, PartitionTable};
use crate::error::{PrecacheError, PrecacheResult};
use crate::net::Response;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// On-disk form of a partition
#[derive(Debug, Serialize, Deserialize)]
struct PartitionFile {
    name: String,
    created_at: DateTime<Utc>,
    entries: Vec<StoredEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: CacheKey,
    response: Response,
}

impl From<&PartitionData> for PartitionFile {
    fn from(data: &PartitionData) -> Self {
        Self {
            name: data.name.clone(),
            created_at: data.created_at,
            entries: data
                .snapshot()
                .into_iter()
                .map(|(key, response)| StoredEntry { key, response })
                .collect(),
        }
    }
}

impl From<PartitionFile> for PartitionData {
    fn from(file: PartitionFile) -> Self {
        Self {
            name: file.name,
            created_at: file.created_at,
            entries: file
                .entries
                .into_iter()
                .map(|e| (e.key, e.response))
                .collect(),
        }
    }
}

/// File name for a partition, derived from its name
fn partition_file_name(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    format!("{}.json", hex::encode(&digest[..6]))
}

/// Whether a path has the shape of a partition file; anything else sharing
/// the directory is left alone
fn is_partition_file(path: &Path) -> bool {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    path.extension().is_some_and(|ext| ext == "json")
        && stem.len() == 12
        && stem.chars().all(|c| c.is_ascii_hexdigit())
}

/// Partition store persisted as JSON files
pub struct DiskStore {
    dir: PathBuf,
    table: Mutex<PartitionTable>,
}

impl DiskStore {
    /// Open (or initialize) a store rooted at `dir`
    pub async fn open(dir: impl Into<PathBuf>) -> PrecacheResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| {
                PrecacheError::io(format!("creating store directory {}", dir.display()), e)
            })?;

        let partitions = Self::load_all(&dir).await?;
        debug!(
            "Loaded {} partition(s) from {}",
            partitions.len(),
            dir.display()
        );

        Ok(Self {
            dir,
            table: Mutex::new(PartitionTable::from_partitions(partitions)),
        })
    }

    async fn load_all(dir: &Path) -> PrecacheResult<Vec<PartitionData>> {
        let mut partitions = Vec::new();
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| PrecacheError::io("reading store directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PrecacheError::io("reading store entry", e))?
        {
            let path = entry.path();
            if !is_partition_file(&path) {
                continue;
            }

            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| PrecacheError::io(format!("reading {}", path.display()), e))?;
            let file: PartitionFile =
                serde_json::from_str(&content).map_err(|e| PrecacheError::PartitionCorrupt {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;

            let expected = partition_file_name(&file.name);
            if path.file_name().and_then(|n| n.to_str()) != Some(expected.as_str()) {
                warn!(
                    "Ignoring partition file {} whose name does not match its contents",
                    path.display()
                );
                continue;
            }

            partitions.push(file.into());
        }

        Ok(partitions)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(partition_file_name(name))
    }

    async fn persist(&self, data: &PartitionData) -> PrecacheResult<()> {
        let path = self.path_for(&data.name);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string(&PartitionFile::from(data))?;

        let write_err = |e: std::io::Error| PrecacheError::PartitionWrite {
            name: data.name.clone(),
            reason: e.to_string(),
        };
        fs::write(&tmp, content).await.map_err(write_err)?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }
        Ok(())
    }

    /// Apply `update` to a copy of the partition, persist it, then commit
    async fn write_through<F>(&self, name: &str, update: F) -> PrecacheResult<()>
    where
        F: FnOnce(&mut PartitionData) + Send,
    {
        let mut table = self.table.lock().await;
        let mut data = table
            .find(name)
            .cloned()
            .unwrap_or_else(|| PartitionData::new(name));
        update(&mut data);
        self.persist(&data).await?;
        table.commit(data);
        Ok(())
    }
}

#[async_trait]
impl PartitionStore for DiskStore {
    async fn create(&self, name: &str) -> PrecacheResult<()> {
        if self.table.lock().await.find(name).is_some() {
            return Ok(());
        }
        self.write_through(name, |_| {}).await
    }

    async fn get(&self, name: &str, key: &CacheKey) -> PrecacheResult<Option<Response>> {
        let table = self.table.lock().await;
        Ok(table.find(name).and_then(|p| p.entries.get(key)).cloned())
    }

    async fn put(&self, name: &str, key: CacheKey, response: Response) -> PrecacheResult<()> {
        self.write_through(name, move |data| {
            data.entries.insert(key, response);
        })
        .await
    }

    async fn put_all(
        &self,
        name: &str,
        entries: Vec<(CacheKey, Response)>,
    ) -> PrecacheResult<()> {
        self.write_through(name, move |data| data.entries.extend(entries))
            .await
    }

    async fn match_any(&self, key: &CacheKey) -> PrecacheResult<Option<Response>> {
        Ok(self.table.lock().await.match_any(key).cloned())
    }

    async fn names(&self) -> PrecacheResult<Vec<String>> {
        Ok(self.table.lock().await.names())
    }

    async fn entries(&self, name: &str) -> PrecacheResult<Option<Vec<(CacheKey, Response)>>> {
        Ok(self.table.lock().await.find(name).map(|p| p.snapshot()))
    }

    async fn delete(&self, name: &str) -> PrecacheResult<bool> {
        let mut table = self.table.lock().await;
        if table.find(name).is_none() {
            return Ok(false);
        }

        let path = self.path_for(name);
        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| PrecacheError::io(format!("deleting {}", path.display()), e))?;
        }
        table.remove(name);
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}
