//! Versioned offline cache worker: install, activate and request interception.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures::future::try_join_all;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{
    cache::{CacheStorage, CachedResponse},
    lifecycle::{InvalidTransition, WorkerEvent, WorkerLifecycle, WorkerPhase},
    network::{AssetRequest, Destination, Network, NetworkError},
};

/// Page served to document navigations when neither cache nor network can answer.
pub const OFFLINE_DOCUMENT: &str = "/index.html";

/// Cache namespace and asset lists a worker installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    pub version: String,
    pub prefix: String,
    pub assets: Vec<String>,
    pub essentials: Vec<String>,
}

impl WorkerSettings {
    pub fn cache_name(&self) -> String {
        format!("{}{}", self.prefix, self.version)
    }
}

/// What the install step managed to store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Every configured asset.
    Full,
    /// Only the essential local files.
    Essentials,
    /// Nothing; the worker still completes installation.
    Empty,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("`{url}` is neither reachable nor cached")]
    Offline { url: String },
    #[error(transparent)]
    Network(#[from] NetworkError),
}

#[derive(Debug, Error)]
enum AddAllError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("`{url}` answered with status {status}")]
    Status { url: String, status: u16 },
}

pub struct OfflineWorker {
    settings: WorkerSettings,
    cache_name: String,
    caches: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    lifecycle: RwLock<WorkerLifecycle>,
    controls_clients: AtomicBool,
}

impl OfflineWorker {
    pub fn new(
        settings: WorkerSettings,
        caches: Arc<CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        let cache_name = settings.cache_name();
        Self {
            settings,
            cache_name,
            caches,
            network,
            lifecycle: RwLock::new(WorkerLifecycle::new()),
            controls_clients: AtomicBool::new(false),
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub async fn phase(&self) -> WorkerPhase {
        self.lifecycle.read().await.phase()
    }

    /// Whether the worker claimed the open clients on activation.
    pub fn controls_clients(&self) -> bool {
        self.controls_clients.load(Ordering::SeqCst)
    }

    async fn transition(&self, event: WorkerEvent) -> Result<WorkerPhase, InvalidTransition> {
        let mut lifecycle = self.lifecycle.write().await;
        lifecycle.apply(event)
    }

    /// Fetch every URL and store them only if all succeeded.
    async fn add_all(&self, urls: &[String]) -> Result<(), AddAllError> {
        let responses = try_join_all(urls.iter().map(|url| self.network.fetch(url))).await?;
        if let Some((url, response)) = urls
            .iter()
            .zip(&responses)
            .find(|(_, response)| !response.is_ok())
        {
            return Err(AddAllError::Status {
                url: url.clone(),
                status: response.status,
            });
        }

        let cache = self.caches.open(&self.cache_name);
        for (url, response) in urls.iter().zip(responses) {
            cache.put(url.clone(), response);
        }
        Ok(())
    }

    /// Populate the cache namespace. Falls back to the essential files and never fails
    /// because of the network.
    pub async fn install(&self) -> Result<InstallOutcome, InvalidTransition> {
        info!(cache = %self.cache_name, "installing offline cache");
        let outcome = match self.add_all(&self.settings.assets).await {
            Ok(()) => InstallOutcome::Full,
            Err(err) => {
                warn!(error = %err, cache = %self.cache_name, "cache install failed; caching essentials only");
                match self.add_all(&self.settings.essentials).await {
                    Ok(()) => InstallOutcome::Essentials,
                    Err(err) => {
                        warn!(error = %err, cache = %self.cache_name, "caching essentials failed");
                        InstallOutcome::Empty
                    }
                }
            }
        };

        self.transition(WorkerEvent::InstallCompleted).await?;
        Ok(outcome)
    }

    /// Take control: evict stale namespaces carrying the worker prefix and claim the clients.
    /// Returns the deleted namespaces.
    pub async fn activate(&self) -> Result<Vec<String>, InvalidTransition> {
        self.transition(WorkerEvent::Activate).await?;

        let mut deleted = Vec::new();
        for name in self.caches.keys() {
            if name != self.cache_name && name.starts_with(&self.settings.prefix) {
                info!(cache = %name, "deleting old cache");
                if self.caches.delete(&name) {
                    deleted.push(name);
                }
            }
        }

        self.controls_clients.store(true, Ordering::SeqCst);
        Ok(deleted)
    }

    pub async fn supersede(&self) -> Result<WorkerPhase, InvalidTransition> {
        self.controls_clients.store(false, Ordering::SeqCst);
        self.transition(WorkerEvent::Superseded).await
    }

    /// Answer an intercepted request. Only an active worker consults its cache.
    pub async fn fetch(&self, request: &AssetRequest) -> Result<CachedResponse, FetchError> {
        if self.phase().await != WorkerPhase::Active {
            return Ok(self.network.fetch(&request.url).await?);
        }

        if request.is_markup_or_script() {
            self.network_first(request).await
        } else {
            self.cache_first(request).await
        }
    }

    async fn network_first(&self, request: &AssetRequest) -> Result<CachedResponse, FetchError> {
        let cache = self.caches.open(&self.cache_name);
        match self.network.fetch(&request.url).await {
            Ok(response) => {
                if response.status == 200 {
                    cache.put(request.url.clone(), response.clone());
                }
                Ok(response)
            }
            Err(err) => {
                debug!(url = %request.url, error = %err, "network failed; serving from cache");
                cache.get(&request.url).ok_or_else(|| FetchError::Offline {
                    url: request.url.clone(),
                })
            }
        }
    }

    async fn cache_first(&self, request: &AssetRequest) -> Result<CachedResponse, FetchError> {
        let cache = self.caches.open(&self.cache_name);
        if let Some(hit) = cache.get(&request.url) {
            return Ok(hit);
        }

        match self.network.fetch(&request.url).await {
            Ok(response) => Ok(response),
            Err(err) => {
                debug!(url = %request.url, error = %err, "cache miss and network failed");
                let fallback = match request.destination {
                    Destination::Document => cache.get(OFFLINE_DOCUMENT),
                    Destination::Other => None,
                };
                fallback.ok_or_else(|| FetchError::Offline {
                    url: request.url.clone(),
                })
            }
        }
    }
}
