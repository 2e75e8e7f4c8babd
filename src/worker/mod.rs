//! The worker: routes install, activate and fetch events
//!
//! A [`Worker`] owns everything an event needs: the asset manifest, the
//! partition store, the fetcher, the client registry and its own lifecycle
//! record. Hosts drive it with three calls:
//!
//! - [`Worker::install`] precaches the app shell
//! - [`Worker::activate`] sweeps stale partitions and claims open clients
//! - [`Worker::intercept`] answers a single request
//!
//! Interception does not depend on the lifecycle state: once the shell
//! partition exists its entries are served.

pub mod factory;
pub mod state;

pub use factory::create_worker;
pub use state::{WorkerRecord, WorkerState};

use crate::audit::AuditLog;
use crate::cache::{CacheNames, PartitionStore};
use crate::classify::{classify, RequestClass};
use crate::clients::ClientRegistry;
use crate::config::Config;
use crate::error::{PrecacheError, PrecacheResult};
use crate::event::Lifetime;
use crate::lifecycle;
use crate::manifest::AssetManifest;
use crate::net::{Fetcher, Request, Response};
use crate::strategy::{ResponseSource, Served, StrategyEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Outcome of a successful activation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activation {
    /// Partitions removed by the sweep
    pub deleted: Vec<String>,
    /// Clients newly controlled by this worker
    pub claimed: usize,
}

/// A handled fetch event
///
/// The response is available immediately. Work the event started in the
/// background (the dynamic cache write) may still be running until
/// [`FetchEvent::settled`] returns.
#[derive(Debug)]
pub struct FetchEvent {
    pub class: RequestClass,
    served: Served,
    lifetime: Lifetime,
}

impl FetchEvent {
    pub fn response(&self) -> &Response {
        &self.served.response
    }

    pub fn source(&self) -> ResponseSource {
        self.served.source
    }

    /// Background tasks still attached to this event
    pub fn pending(&self) -> usize {
        self.lifetime.pending()
    }

    /// Wait for the event's background work, then hand back the response
    pub async fn settled(self) -> Served {
        self.lifetime.settled().await;
        self.served
    }
}

/// Offline-capable request interceptor
pub struct Worker {
    manifest: AssetManifest,
    scope: Url,
    names: CacheNames,
    store: Arc<dyn PartitionStore>,
    fetcher: Arc<dyn Fetcher>,
    clients: Arc<ClientRegistry>,
    engine: StrategyEngine,
    audit: AuditLog,
    record: Mutex<WorkerRecord>,
    record_path: Option<PathBuf>,
}

impl Worker {
    /// Build a worker from config with explicit store and fetcher
    pub fn new(
        config: &Config,
        store: Arc<dyn PartitionStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> PrecacheResult<Self> {
        let scope = Url::parse(&config.scope.url)
            .map_err(|e| PrecacheError::invalid_url(&config.scope.url, e))?;
        let fallback = scope
            .join(&config.shell.offline_fallback)
            .map_err(|e| PrecacheError::invalid_url(&config.shell.offline_fallback, e))?;

        let names = CacheNames::from_config(&config.caches);
        let clients = Arc::new(ClientRegistry::new());
        let engine = StrategyEngine::new(
            store.clone(),
            fetcher.clone(),
            clients.clone(),
            names.clone(),
            &fallback,
        );

        Ok(Self {
            manifest: AssetManifest::new(config.shell.assets.iter().cloned()),
            scope,
            names,
            store,
            fetcher,
            clients,
            engine,
            audit: AuditLog::disabled(),
            record: Mutex::new(WorkerRecord::new(&config.caches.version)),
            record_path: None,
        })
    }

    /// Journal lifecycle events and dynamic writes
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.engine = self.engine.with_audit(audit.clone());
        self.audit = audit;
        self
    }

    /// Persist the lifecycle record at `path`
    ///
    /// A record saved by an earlier process for the same cache version is
    /// picked up; one for another version is ignored and replaced on the
    /// next transition. A record stuck in `installing` or `activating` was
    /// left by a process that never finished and is settled first.
    pub async fn with_record_path(mut self, path: impl Into<PathBuf>) -> PrecacheResult<Self> {
        let path = path.into();
        if let Some(mut saved) = WorkerRecord::load(&path).await? {
            let current = self.record.get_mut();
            if saved.version == current.version {
                if let Some(abandoned) = saved.recover() {
                    warn!(
                        "Worker {} was left {}; resuming as {}",
                        saved.id, abandoned, saved.state
                    );
                    saved.save(&path).await?;
                }
                debug!("Resuming worker {} ({})", saved.id, saved.state);
                *current = saved;
            } else {
                debug!(
                    "Ignoring worker state for version {} (current {})",
                    saved.version, current.version
                );
            }
        }
        self.record_path = Some(path);
        Ok(self)
    }

    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub fn store(&self) -> &Arc<dyn PartitionStore> {
        &self.store
    }

    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }

    pub async fn state(&self) -> WorkerState {
        self.record.lock().await.state
    }

    pub async fn record(&self) -> WorkerRecord {
        self.record.lock().await.clone()
    }

    /// Precache the app shell
    ///
    /// Returns the number of shell entries stored. On failure the worker
    /// becomes redundant and the error is returned.
    pub async fn install(&self) -> PrecacheResult<usize> {
        self.begin("install", WorkerState::can_install, WorkerState::Installing)
            .await?;
        info!("Installing worker for {}", self.scope);

        let result = lifecycle::precache_shell(
            self.store.clone(),
            self.fetcher.as_ref(),
            &self.names.shell,
            &self.manifest,
            &self.scope,
        )
        .await;

        match result {
            Ok(stored) => {
                self.finish(WorkerState::Installed).await?;
                info!("Worker installed, skip-waiting set");
                self.audit
                    .log(
                        "worker.installed",
                        &serde_json::json!({
                            "partition": self.names.shell,
                            "entries": stored,
                        }),
                    )
                    .await;
                Ok(stored)
            }
            Err(e) => {
                warn!("Install failed: {}", e);
                self.finish(WorkerState::Redundant).await?;
                Err(e)
            }
        }
    }

    /// Remove stale partitions and take control of open clients
    pub async fn activate(&self) -> PrecacheResult<Activation> {
        let previous = self
            .begin("activate", WorkerState::can_activate, WorkerState::Activating)
            .await?;
        info!("Activating worker for {}", self.scope);

        let deleted = match lifecycle::sweep_stale(
            self.store.as_ref(),
            &self.names.allow_list(),
            &self.audit,
        )
        .await
        {
            Ok(deleted) => deleted,
            Err(e) => {
                self.finish(previous).await?;
                return Err(e);
            }
        };

        let claimed = self.clients.claim().await;
        {
            let mut record = self.record.lock().await;
            record.claimed = claimed;
        }
        self.finish(WorkerState::Activated).await?;

        info!(
            "Worker activated: {} stale partitions removed, {} clients claimed",
            deleted.len(),
            claimed
        );
        self.audit
            .log(
                "worker.activated",
                &serde_json::json!({ "deleted": deleted, "claimed": claimed }),
            )
            .await;

        Ok(Activation { deleted, claimed })
    }

    /// Answer one request
    pub async fn intercept(
        &self,
        request: &Request,
        client_id: Option<&str>,
    ) -> PrecacheResult<FetchEvent> {
        let class = classify(&self.manifest, &request.url);
        debug!("{} {} classified as {}", request.method, request.url, class);

        let mut lifetime = Lifetime::new();
        let served = self
            .engine
            .respond(class, request, client_id, &mut lifetime)
            .await?;

        Ok(FetchEvent {
            class,
            served,
            lifetime,
        })
    }

    /// Answer a request on its own task
    pub fn dispatch(
        self: &Arc<Self>,
        request: Request,
        client_id: Option<String>,
    ) -> JoinHandle<PrecacheResult<FetchEvent>> {
        let worker = Arc::clone(self);
        tokio::spawn(async move { worker.intercept(&request, client_id.as_deref()).await })
    }

    /// Check and enter an in-progress state; returns the state left behind
    async fn begin(
        &self,
        action: &'static str,
        allowed: fn(&WorkerState) -> bool,
        next: WorkerState,
    ) -> PrecacheResult<WorkerState> {
        let mut record = self.record.lock().await;
        let previous = record.state;
        if !allowed(&previous) {
            return Err(PrecacheError::InvalidState {
                action,
                state: previous.to_string(),
            });
        }
        record.transition(next);
        self.persist(&record).await?;
        Ok(previous)
    }

    async fn finish(&self, state: WorkerState) -> PrecacheResult<()> {
        let mut record = self.record.lock().await;
        record.transition(state);
        self.persist(&record).await
    }

    async fn persist(&self, record: &WorkerRecord) -> PrecacheResult<()> {
        match &self.record_path {
            Some(path) => record.save(path).await,
            None => Ok(()),
        }
    }
}
