//! Response strategies
//!
//! | Class | Strategy | Miss | Network failure |
//! |-------|----------|------|-----------------|
//! | app shell | cache-first | fetch, do not store | error to caller |
//! | dynamic | cache-then-network | fetch, store if 2xx or opaque | offline fallback page |

mod cache_first;
mod cache_then_network;

use crate::audit::AuditLog;
use crate::cache::{CacheKey, CacheNames, PartitionStore};
use crate::classify::RequestClass;
use crate::clients::ClientRegistry;
use crate::error::PrecacheResult;
use crate::event::Lifetime;
use crate::net::{Fetcher, Request, Response};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Where a delivered response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from a partition
    Cache,
    /// Straight from the network, not written anywhere
    Network,
    /// From the network; a copy is being written to the dynamic partition
    NetworkStored,
    /// Network unreachable; the cached offline page was served instead
    OfflineFallback,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
            Self::NetworkStored => write!(f, "network (stored)"),
            Self::OfflineFallback => write!(f, "offline fallback"),
        }
    }
}

/// A response and its provenance
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

impl Served {
    fn new(response: Response, source: ResponseSource) -> Self {
        Self { response, source }
    }
}

/// Runs the strategy for a classified request
#[derive(Clone)]
pub struct StrategyEngine {
    store: Arc<dyn PartitionStore>,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<ClientRegistry>,
    names: CacheNames,
    offline_fallback: CacheKey,
    audit: AuditLog,
}

impl StrategyEngine {
    pub fn new(
        store: Arc<dyn PartitionStore>,
        fetcher: Arc<dyn Fetcher>,
        clients: Arc<ClientRegistry>,
        names: CacheNames,
        offline_fallback: &Url,
    ) -> Self {
        Self {
            store,
            fetcher,
            clients,
            names,
            offline_fallback: CacheKey::for_url(offline_fallback),
            audit: AuditLog::disabled(),
        }
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// Produce the response for one request
    ///
    /// Background work (the dynamic cache write) is registered on `lifetime`.
    pub async fn respond(
        &self,
        class: RequestClass,
        request: &Request,
        client_id: Option<&str>,
        lifetime: &mut Lifetime,
    ) -> PrecacheResult<Served> {
        match class {
            RequestClass::ShellAsset => self.cache_first(request).await,
            RequestClass::Dynamic => {
                self.cache_then_network(request, client_id, lifetime)
                    .await
            }
        }
    }
}
