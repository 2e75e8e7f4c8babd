//! Cache-first strategy for app shell assets
//!
//! A miss goes to the network and the result is returned as-is. Nothing is
//! written back: the shell partition is only populated on install, so a
//! missing shell entry stays missing until the next install.

use crate::cache::CacheKey;
use crate::error::PrecacheResult;
use crate::net::Request;
use crate::strategy::{ResponseSource, Served, StrategyEngine};
use tracing::debug;

impl StrategyEngine {
    pub(crate) async fn cache_first(&self, request: &Request) -> PrecacheResult<Served> {
        let key = CacheKey::for_request(request);

        let cached = match self.store.get(&self.names.shell, &key).await? {
            Some(hit) => Some(hit),
            None => self.store.match_any(&key).await?,
        };

        if let Some(response) = cached {
            debug!("App shell served from cache: {}", request.url);
            return Ok(Served::new(response, ResponseSource::Cache));
        }

        debug!("App shell miss, fetching: {}", request.url);
        // Failures propagate; there is no fallback page on this path
        let response = self.fetcher.fetch(request).await?;
        Ok(Served::new(response, ResponseSource::Network))
    }
}
