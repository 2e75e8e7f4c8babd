//! Client registry and cache-hit notifications
//!
//! Every open document that issues requests registers here and receives a
//! channel. The worker posts a [`CacheNotice`] to the originating client when
//! a dynamic request is answered from cache. Delivery is best-effort.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Message posted to a client when its request was served from cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheNotice {
    pub url: String,
    pub cached: bool,
}

impl CacheNotice {
    pub fn cached(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cached: true,
        }
    }
}

struct ClientSlot {
    sender: mpsc::UnboundedSender<CacheNotice>,
    controlled: bool,
}

/// Open clients, addressable by id
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, ClientSlot>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client and return the receiving end of its message channel
    ///
    /// Re-registering an id replaces the previous channel.
    pub async fn register(&self, id: &str) -> mpsc::UnboundedReceiver<CacheNotice> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.clients.write().await.insert(
            id.to_string(),
            ClientSlot {
                sender,
                controlled: false,
            },
        );
        receiver
    }

    /// Forget a client; its channel closes once the registry drops the sender
    pub async fn unregister(&self, id: &str) -> bool {
        self.clients.write().await.remove(id).is_some()
    }

    /// Post a notice to a client; unknown or closed clients are ignored
    pub async fn notify(&self, id: &str, notice: CacheNotice) {
        let clients = self.clients.read().await;
        match clients.get(id) {
            Some(slot) => {
                if slot.sender.send(notice).is_err() {
                    debug!("Client {} is closed, dropping notice", id);
                }
            }
            None => debug!("Client {} not found, dropping notice", id),
        }
    }

    /// Take control of every open client; returns how many were newly claimed
    pub async fn claim(&self) -> usize {
        let mut clients = self.clients.write().await;
        let mut claimed = 0;
        for slot in clients.values_mut().filter(|s| !s.sender.is_closed()) {
            if !slot.controlled {
                slot.controlled = true;
                claimed += 1;
            }
        }
        claimed
    }

    pub async fn is_controlled(&self, id: &str) -> bool {
        self.clients
            .read()
            .await
            .get(id)
            .is_some_and(|s| s.controlled)
    }
}
