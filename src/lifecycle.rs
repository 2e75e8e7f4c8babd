//! Install and activate steps
//!
//! Install fills the shell partition from the manifest, all or nothing.
//! Activate removes every partition that is not current.

use crate::audit::AuditLog;
use crate::cache::{AllowList, CacheKey, Partition, PartitionStore};
use crate::error::{PrecacheError, PrecacheResult};
use crate::manifest::AssetManifest;
use crate::net::{Fetcher, Request, Response};
use futures_util::future::{join_all, try_join_all};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Fetch every manifest asset and store them in the shell partition
///
/// All fetches run concurrently. If any of them fails or returns a non-2xx
/// status, nothing is written and `StartupAbort` is returned. Returns the
/// number of entries written (assets that resolve to the same URL collapse
/// into one entry).
pub async fn precache_shell(
    store: Arc<dyn PartitionStore>,
    fetcher: &dyn Fetcher,
    shell: &str,
    manifest: &AssetManifest,
    scope: &Url,
) -> PrecacheResult<usize> {
    let requests = manifest.requests(scope)?;
    let partition = Partition::open(store, shell).await?;

    info!(
        "Precaching {} app shell assets into {}",
        requests.len(),
        partition.name()
    );

    let fetched = try_join_all(requests.iter().map(|r| fetch_asset(fetcher, r))).await?;

    let entries: Vec<(CacheKey, Response)> = requests
        .iter()
        .map(CacheKey::for_request)
        .zip(fetched)
        .collect();
    partition.put_all(entries).await?;

    let stored = partition.len().await?;
    info!("App shell precached: {} entries in {}", stored, partition.name());
    Ok(stored)
}

async fn fetch_asset(fetcher: &dyn Fetcher, request: &Request) -> PrecacheResult<Response> {
    let response = fetcher
        .fetch(request)
        .await
        .map_err(|e| PrecacheError::StartupAbort {
            url: request.url.to_string(),
            reason: e.to_string(),
        })?;

    if !response.ok() {
        return Err(PrecacheError::StartupAbort {
            url: request.url.to_string(),
            reason: format!("status {}", response.status),
        });
    }

    debug!("Fetched app shell asset {}", request.url);
    Ok(response)
}

/// Delete every partition whose name is not on the allow-list
///
/// Deletions run concurrently and all of them are awaited before returning.
/// Returns the deleted names; if any deletion failed, the first failure is
/// returned after the rest have settled.
pub async fn sweep_stale(
    store: &dyn PartitionStore,
    allow: &AllowList,
    audit: &AuditLog,
) -> PrecacheResult<Vec<String>> {
    let stale = allow.stale(&store.names().await?);
    if stale.is_empty() {
        debug!("No stale partitions");
        return Ok(stale);
    }

    let results = join_all(stale.iter().map(|name| store.delete(name))).await;

    let mut deleted = Vec::new();
    let mut first_error = None;
    for (name, result) in stale.into_iter().zip(results) {
        match result {
            Ok(existed) => {
                if existed {
                    info!("Deleted stale partition {}", name);
                    audit
                        .log("partition.deleted", &serde_json::json!({ "name": name }))
                        .await;
                }
                deleted.push(name);
            }
            Err(e) => {
                warn!("Failed to delete partition {}: {}", name, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(deleted),
    }
}
