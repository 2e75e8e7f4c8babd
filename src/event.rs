//! Event lifetime extension
//!
//! A response can be delivered before all work for the event is done (the
//! dynamic cache write runs after the caller already has its response).
//! Such work is spawned through [`Lifetime::wait_until`] so it runs to
//! completion regardless of the caller, and the host can await
//! [`Lifetime::settled`] to know when the event is truly finished.

use futures_util::future::join_all;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::warn;

/// Background work an event must outlive
#[derive(Debug, Default)]
pub struct Lifetime {
    tasks: Vec<JoinHandle<()>>,
}

impl Lifetime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the event until `work` finishes
    ///
    /// The work starts immediately on the runtime and is not cancelled if
    /// this `Lifetime` is dropped.
    pub fn wait_until<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push(tokio::spawn(work));
    }

    /// Number of extensions registered
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every extension to settle
    pub async fn settled(self) {
        for result in join_all(self.tasks).await {
            if let Err(e) = result {
                warn!("Background task for event did not complete: {}", e);
            }
        }
    }
}
