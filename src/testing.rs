//! Shared fixtures for unit tests

use crate::cache::{CacheKey, CacheNames, MemoryStore, PartitionStore};
use crate::clients::ClientRegistry;
use crate::error::{PrecacheError, PrecacheResult};
use crate::net::{Fetcher, Request, Response};
use crate::strategy::StrategyEngine;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

pub const SCOPE: &str = "http://localhost:8080/";
pub const SHELL: &str = "app-shell-v1";
pub const DYNAMIC: &str = "dynamic-resources-v1";
pub const FALLBACK: &str = "http://localhost:8080/home.html";

#[derive(Debug, Clone)]
enum Outcome {
    Status(u16, String),
    Opaque(String),
    Fail,
}

/// Fetcher answering from a fixed table and counting calls per URL
///
/// URLs without an entry fail like an unreachable host.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    routes: HashMap<String, Outcome>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes
            .insert(url.to_string(), Outcome::Status(status, body.to_string()));
        self
    }

    pub fn opaque(mut self, url: &str, body: &str) -> Self {
        self.routes
            .insert(url.to_string(), Outcome::Opaque(body.to_string()));
        self
    }

    pub fn fail(mut self, url: &str) -> Self {
        self.routes.insert(url.to_string(), Outcome::Fail);
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response> {
        let url = request.url.as_str();
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;

        match self.routes.get(url) {
            Some(Outcome::Status(status, body)) => {
                Ok(Response::new(*status, body.as_bytes()).with_url(url))
            }
            Some(Outcome::Opaque(body)) => Ok(Response::opaque(url, body.as_bytes())),
            Some(Outcome::Fail) | None => Err(PrecacheError::network(url, "connection refused")),
        }
    }

    fn fetcher_name(&self) -> &'static str {
        "scripted"
    }
}

/// Store that serves reads from memory and rejects every write
#[derive(Default)]
pub struct ReadOnlyStore {
    inner: MemoryStore,
    rejected: AtomicUsize,
}

impl ReadOnlyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes refused so far
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    fn reject(&self, name: &str) -> PrecacheError {
        self.rejected.fetch_add(1, Ordering::SeqCst);
        PrecacheError::PartitionWrite {
            name: name.to_string(),
            reason: "read-only file system".to_string(),
        }
    }
}

#[async_trait]
impl PartitionStore for ReadOnlyStore {
    async fn create(&self, name: &str) -> PrecacheResult<()> {
        Err(self.reject(name))
    }

    async fn get(&self, name: &str, key: &CacheKey) -> PrecacheResult<Option<Response>> {
        self.inner.get(name, key).await
    }

    async fn put(&self, name: &str, _key: CacheKey, _response: Response) -> PrecacheResult<()> {
        Err(self.reject(name))
    }

    async fn put_all(
        &self,
        name: &str,
        _entries: Vec<(CacheKey, Response)>,
    ) -> PrecacheResult<()> {
        Err(self.reject(name))
    }

    async fn match_any(&self, key: &CacheKey) -> PrecacheResult<Option<Response>> {
        self.inner.match_any(key).await
    }

    async fn names(&self) -> PrecacheResult<Vec<String>> {
        self.inner.names().await
    }

    async fn entries(&self, name: &str) -> PrecacheResult<Option<Vec<(CacheKey, Response)>>> {
        self.inner.entries(name).await
    }

    async fn delete(&self, name: &str) -> PrecacheResult<bool> {
        self.inner.delete(name).await
    }

    fn backend_name(&self) -> &'static str {
        "read-only"
    }
}

pub fn names() -> CacheNames {
    CacheNames::new("app-shell", "dynamic-resources", "v1")
}

pub fn engine(store: Arc<dyn PartitionStore>, fetcher: Arc<dyn Fetcher>) -> StrategyEngine {
    engine_with_clients(store, fetcher).0
}

pub fn engine_with_clients(
    store: Arc<dyn PartitionStore>,
    fetcher: Arc<dyn Fetcher>,
) -> (StrategyEngine, Arc<ClientRegistry>) {
    let clients = Arc::new(ClientRegistry::new());
    let fallback = Url::parse(FALLBACK).unwrap();
    let engine = StrategyEngine::new(store, fetcher, clients.clone(), names(), &fallback);
    (engine, clients)
}
