//! Offline layer in front of the board's static assets: a versioned cache populated by a
//! worker that is replaced whenever a new cache version is registered.

pub mod cache;
pub mod lifecycle;
pub mod network;
pub mod worker;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use self::{
    cache::{CacheStorage, CachedResponse},
    lifecycle::InvalidTransition,
    network::{AssetRequest, Network},
    worker::{FetchError, InstallOutcome, OfflineWorker, WorkerSettings},
};

/// Owns the cache storage and the currently active worker.
pub struct OfflineRuntime {
    caches: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    active: RwLock<Option<Arc<OfflineWorker>>>,
}

impl OfflineRuntime {
    pub fn new(network: Arc<dyn Network>) -> Self {
        Self {
            caches: Arc::new(CacheStorage::new()),
            network,
            active: RwLock::new(None),
        }
    }

    pub fn caches(&self) -> &CacheStorage {
        &self.caches
    }

    pub async fn active_worker(&self) -> Option<Arc<OfflineWorker>> {
        self.active.read().await.clone()
    }

    /// Install a worker for `settings` and activate it right away, retiring the previous one.
    pub async fn register(
        &self,
        settings: WorkerSettings,
    ) -> Result<(Arc<OfflineWorker>, InstallOutcome), InvalidTransition> {
        let worker = Arc::new(OfflineWorker::new(
            settings,
            self.caches.clone(),
            self.network.clone(),
        ));
        let outcome = worker.install().await?;

        let mut active = self.active.write().await;
        if let Some(previous) = active.take() {
            if let Err(err) = previous.supersede().await {
                warn!(error = %err, cache = %previous.cache_name(), "failed to retire previous worker");
            }
        }
        worker.activate().await?;
        *active = Some(worker.clone());

        info!(cache = %worker.cache_name(), ?outcome, "offline worker active");
        Ok((worker, outcome))
    }

    /// Serve a request through the active worker, or straight from the network without one.
    pub async fn fetch(&self, request: &AssetRequest) -> Result<CachedResponse, FetchError> {
        match self.active_worker().await {
            Some(worker) => worker.fetch(request).await,
            None => Ok(self.network.fetch(&request.url).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::{
        lifecycle::WorkerPhase,
        network::{Destination, testing::ScriptedNetwork},
    };

    fn settings(version: &str) -> WorkerSettings {
        WorkerSettings {
            version: version.into(),
            prefix: "game-night-".into(),
            assets: vec!["/index.html".into()],
            essentials: vec!["/index.html".into()],
        }
    }

    #[tokio::test]
    async fn version_bump_retires_previous_worker_and_cache() {
        let network = ScriptedNetwork::new();
        network.serve("/index.html", 200, "index");
        let runtime = OfflineRuntime::new(Arc::new(network.clone()));

        let (first, outcome) = runtime.register(settings("v1")).await.unwrap();
        assert_eq!(outcome, InstallOutcome::Full);
        assert_eq!(first.phase().await, WorkerPhase::Active);

        let (second, _) = runtime.register(settings("v2")).await.unwrap();
        assert_eq!(first.phase().await, WorkerPhase::Redundant);
        assert!(!first.controls_clients());
        assert_eq!(second.phase().await, WorkerPhase::Active);
        assert_eq!(runtime.caches().keys(), vec!["game-night-v2".to_owned()]);

        network.set_offline(true);
        let page = runtime
            .fetch(&AssetRequest::new("/index.html", Destination::Document))
            .await
            .unwrap();
        assert_eq!(page.body.as_ref(), b"index");
    }

    #[tokio::test]
    async fn without_worker_requests_go_to_the_network() {
        let network = ScriptedNetwork::new();
        network.serve("/index.html", 200, "index");
        let runtime = OfflineRuntime::new(Arc::new(network.clone()));

        runtime
            .fetch(&AssetRequest::new("/index.html", Destination::Document))
            .await
            .unwrap();
        network.set_offline(true);
        assert!(
            runtime
                .fetch(&AssetRequest::new("/index.html", Destination::Document))
                .await
                .is_err()
        );
    }
}
