//! Worker factory
//!
//! Wires a [`Worker`] to the store backend and HTTP fetcher named in config.

use crate::audit::AuditLog;
use crate::cache::{DiskStore, MemoryStore, PartitionStore};
use crate::config::schema::StoreBackend;
use crate::config::{Config, ConfigManager};
use crate::error::{PrecacheError, PrecacheResult};
use crate::net::{Fetcher, HttpFetcher};
use crate::worker::Worker;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Lifecycle record file inside a disk store's directory
pub const WORKER_RECORD_FILE: &str = "worker.json";

/// Directory of the disk backend: `[store].path` or the default partitions dir
pub fn store_dir(config: &Config) -> PathBuf {
    config
        .store
        .path
        .clone()
        .unwrap_or_else(ConfigManager::partitions_dir)
}
use url::Url;

/// Create the partition store selected by `[store].backend`
pub async fn create_store(config: &Config) -> PrecacheResult<Arc<dyn PartitionStore>> {
    match config.store.backend {
        StoreBackend::Disk => {
            let dir = store_dir(config);
            debug!("Using disk store at {}", dir.display());
            Ok(Arc::new(DiskStore::open(dir).await?))
        }
        StoreBackend::Memory => {
            debug!("Using memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Create a fully wired worker
///
/// With the disk backend the lifecycle record is persisted in the store
/// directory, so invocations sharing a store share the record and stores
/// at different paths never do. The memory backend keeps
/// nothing between runs, so neither does its worker.
pub async fn create_worker(config: &Config) -> PrecacheResult<Worker> {
    let scope = Url::parse(&config.scope.url)
        .map_err(|e| PrecacheError::invalid_url(&config.scope.url, e))?;

    let store = create_store(config).await?;
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.network, scope));
    debug!(
        "Worker uses {} store and {} fetcher",
        store.backend_name(),
        fetcher.fetcher_name()
    );

    let worker = Worker::new(config, store, fetcher)?.with_audit(AuditLog::new(config));

    match config.store.backend {
        StoreBackend::Disk => {
            worker
                .with_record_path(store_dir(config).join(WORKER_RECORD_FILE))
                .await
        }
        StoreBackend::Memory => Ok(worker),
    }
}
