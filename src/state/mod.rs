pub mod controller;
pub mod form;

use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig, dao::record_store::RecordStore, error::ServiceError,
    offline::OfflineRuntime, offline::network::Network,
};

use self::{controller::BoardController, form::PlayForm};

pub type SharedState = Arc<AppState>;

/// Central application state: the record store handle, the board controller, the add-play
/// form and the offline runtime.
pub struct AppState {
    record_store: RwLock<Option<Arc<dyn RecordStore>>>,
    controller: RwLock<BoardController>,
    form: RwLock<PlayForm>,
    offline: OfflineRuntime,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a record store is installed.
    pub fn new(config: AppConfig, network: Arc<dyn Network>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let now = OffsetDateTime::now_utc().to_offset(config.utc_offset());
        Arc::new(Self {
            record_store: RwLock::new(None),
            controller: RwLock::new(BoardController::new(now)),
            form: RwLock::new(PlayForm::new(now)),
            offline: OfflineRuntime::new(network),
            config,
            degraded: degraded_tx,
        })
    }

    /// Current time in the board's configured offset.
    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.config.utc_offset())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current record store, if one is installed.
    pub async fn record_store(&self) -> Option<Arc<dyn RecordStore>> {
        let guard = self.record_store.read().await;
        guard.as_ref().cloned()
    }

    /// Record store handle, or [`ServiceError::Degraded`] while none is installed.
    pub async fn require_record_store(&self) -> Result<Arc<dyn RecordStore>, ServiceError> {
        self.record_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new record store implementation and leave degraded mode.
    pub async fn set_record_store(&self, store: Arc<dyn RecordStore>) {
        {
            let mut guard = self.record_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current record store and enter degraded mode.
    pub async fn clear_record_store(&self) {
        {
            let mut guard = self.record_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only when it changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    pub fn controller(&self) -> &RwLock<BoardController> {
        &self.controller
    }

    /// The add-play form being edited.
    pub fn form(&self) -> &RwLock<PlayForm> {
        &self.form
    }

    pub fn offline(&self) -> &OfflineRuntime {
        &self.offline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::record_store::memory::MemoryRecordStore, offline::network::testing::ScriptedNetwork,
    };

    #[tokio::test]
    async fn degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default(), Arc::new(ScriptedNetwork::new()));
        let mut watcher = state.degraded_watcher();
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_record_store().await,
            Err(ServiceError::Degraded)
        ));

        state
            .set_record_store(Arc::new(MemoryRecordStore::new()))
            .await;
        assert!(!state.is_degraded());
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());

        state.clear_record_store().await;
        assert!(state.is_degraded());
    }
}
