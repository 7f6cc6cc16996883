//! Game night board binary entrypoint wiring the HTTP surface, the record store and the
//! offline asset cache.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "couch-store")]
use game_night_board::dao::record_store::couchdb::{CouchConfig, CouchRecordStore};
#[cfg(feature = "mongo-store")]
use game_night_board::dao::record_store::mongodb::{MongoConfig, MongoRecordStore};
#[cfg(any(feature = "couch-store", feature = "mongo-store"))]
use game_night_board::{
    dao::{record_store::RecordStore, storage::StorageError},
    services::storage_supervisor,
};
use game_night_board::{
    config::AppConfig,
    dao::record_store::memory::MemoryRecordStore,
    offline::network::HttpNetwork,
    routes,
    state::{AppState, SharedState},
};

const DEFAULT_BACKEND: &str = "couch";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let network = HttpNetwork::new(config.asset_origin()).context("building asset client")?;
    let app_state = AppState::new(config, Arc::new(network));

    tokio::spawn(register_offline_worker(app_state.clone()));
    start_record_store(app_state.clone()).await?;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Populate the asset cache in the background; failures only cost offline support.
async fn register_offline_worker(state: SharedState) {
    let settings = state.config().cache().clone();
    match state.offline().register(settings).await {
        Ok((worker, outcome)) => {
            info!(cache = %worker.cache_name(), ?outcome, "offline cache ready");
        }
        Err(err) => error!(error = %err, "failed to register offline worker"),
    }
}

/// Install the record store selected by `STORE_BACKEND`. Remote stores are connected by the
/// storage supervisor so the server starts in degraded mode until they answer.
async fn start_record_store(state: SharedState) -> anyhow::Result<()> {
    let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| DEFAULT_BACKEND.into());
    info!(%backend, "selecting record store");

    match backend.as_str() {
        "memory" => {
            warn!("using the in-memory record store; records are lost on shutdown");
            state
                .set_record_store(Arc::new(MemoryRecordStore::new()))
                .await;
        }
        #[cfg(feature = "couch-store")]
        "couch" => {
            let config = CouchConfig::from_env().context("reading CouchDB configuration")?;
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = CouchRecordStore::connect(config).await?;
                    Ok::<Arc<dyn RecordStore>, StorageError>(Arc::new(store))
                }
            }));
        }
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            let config = MongoConfig::from_env()
                .await
                .context("reading MongoDB configuration")?;
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = MongoRecordStore::connect(config).await?;
                    Ok::<Arc<dyn RecordStore>, StorageError>(Arc::new(store))
                }
            }));
        }
        other => anyhow::bail!("unsupported STORE_BACKEND `{other}`"),
    }

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
