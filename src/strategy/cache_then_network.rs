//! Cache-then-network strategy for dynamic requests
//!
//! Lookup runs in two stages across all partitions: first by full request
//! identity, then by bare URL. A hit notifies the originating client. On a
//! double miss the response comes from the network and, when valid, a copy
//! is written to the dynamic partition keyed by bare URL.

use crate::audit::AuditLog;
use crate::cache::{CacheKey, Partition, PartitionStore};
use crate::clients::CacheNotice;
use crate::error::PrecacheResult;
use crate::event::Lifetime;
use crate::net::{Method, Request, Response};
use crate::strategy::{ResponseSource, Served, StrategyEngine};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl StrategyEngine {
    pub(crate) async fn cache_then_network(
        &self,
        request: &Request,
        client_id: Option<&str>,
        lifetime: &mut Lifetime,
    ) -> PrecacheResult<Served> {
        if let Some(response) = self.store.match_any(&CacheKey::for_request(request)).await? {
            debug!("Dynamic hit by request: {}", request.url);
            self.notify_cached(request, client_id).await;
            return Ok(Served::new(response, ResponseSource::Cache));
        }

        if let Some(response) = self.store.match_any(&CacheKey::for_url(&request.url)).await? {
            debug!("Dynamic hit by URL: {}", request.url);
            self.notify_cached(request, client_id).await;
            return Ok(Served::new(response, ResponseSource::Cache));
        }

        self.fetch_and_cache(request, lifetime).await
    }

    async fn fetch_and_cache(
        &self,
        request: &Request,
        lifetime: &mut Lifetime,
    ) -> PrecacheResult<Served> {
        let response = match self.fetcher.fetch(request).await {
            Ok(response) => response,
            Err(err) => {
                error!("Network failure for {}: {}", request.url, err);
                return match self.store.match_any(&self.offline_fallback).await? {
                    Some(page) => Ok(Served::new(page, ResponseSource::OfflineFallback)),
                    None => {
                        warn!(
                            "Offline fallback {} is not cached",
                            self.offline_fallback.url
                        );
                        Err(err)
                    }
                };
            }
        };

        if !response.is_cacheable() {
            info!(
                "Not caching invalid response for {}: status {} ({})",
                request.url, response.status, response.kind
            );
            return Ok(Served::new(response, ResponseSource::Network));
        }

        if request.method != Method::Get {
            warn!(
                "Not caching {} {}: only GET responses can be stored",
                request.method, request.url
            );
            return Ok(Served::new(response, ResponseSource::Network));
        }

        let copy = response.clone();
        let store = self.store.clone();
        let name = self.names.dynamic.clone();
        let key = CacheKey::for_url(&request.url);
        let audit = self.audit.clone();
        lifetime.wait_until(async move {
            write_dynamic(store, name, key, copy, audit).await;
        });

        Ok(Served::new(response, ResponseSource::NetworkStored))
    }

    async fn notify_cached(&self, request: &Request, client_id: Option<&str>) {
        if let Some(id) = client_id {
            self.clients
                .notify(id, CacheNotice::cached(request.url.as_str()))
                .await;
        }
    }
}

/// Store a network response in the dynamic partition
///
/// The caller already has its response, so failures are only logged.
async fn write_dynamic(
    store: Arc<dyn PartitionStore>,
    name: String,
    key: CacheKey,
    response: Response,
    audit: AuditLog,
) {
    let result = async {
        let partition = Partition::open(store, &name).await?;
        partition.put(key.clone(), response).await
    };

    match result.await {
        Ok(()) => {
            info!("Stored in {}: {}", name, key.url);
            audit
                .log(
                    "dynamic.stored",
                    &serde_json::json!({"partition": name, "url": key.url}),
                )
                .await;
        }
        Err(e) => warn!("Failed to store {} in {}: {}", key.url, name, e),
    }
}
