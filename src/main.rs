//! Chat2Edit server binary.
//!
//! Startup:
//! 1. Load and validate configuration
//! 2. Initialise tracing
//! 3. Build the progress backend (Redis or in-memory)
//! 4. Wire the generation task, lifecycle controller and relay
//! 5. Serve HTTP until Ctrl-C / SIGTERM

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use chat2edit::adapters::http::{app_router, Chat2EditAppState};
use chat2edit::adapters::progress::{
    InMemoryEventLogStore, InMemoryProgressBus, ProgressKeys, RedisEventLogStore,
    RedisProgressBus,
};
use chat2edit::adapters::{HttpObjectStorage, ScriptedGenerationTask};
use chat2edit::application::progress::{CycleLifecycleController, ProgressRelay};
use chat2edit::config::{AppConfig, ProgressBackend};
use chat2edit::ports::{EventLogStore, ProgressBus};

type Backend = (Arc<dyn EventLogStore>, Arc<dyn ProgressBus>);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let (store, bus) = build_backend(&config).await?;

    let mut task = ScriptedGenerationTask::new();
    if let Some(url) = &config.storage.storage_api_url {
        let storage = HttpObjectStorage::new(url.clone(), config.storage.timeout())?;
        task = task.with_storage(Arc::new(storage));
    }

    let state = Chat2EditAppState {
        controller: CycleLifecycleController::new(store.clone(), bus.clone(), Arc::new(task)),
        relay: ProgressRelay::new(store, bus, config.progress.idle_timeout()),
        generation: config.generation.clone(),
    };

    let app = app_router(state, &config.server);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        backend = ?config.progress.backend,
        environment = ?config.server.environment,
        "Chat2Edit server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_backend(config: &AppConfig) -> Result<Backend, Box<dyn std::error::Error>> {
    let progress = &config.progress;

    match progress.backend {
        ProgressBackend::Memory => {
            tracing::warn!("Using in-memory progress backend; progress is not shared across processes");
            let store: Arc<dyn EventLogStore> = Arc::new(InMemoryEventLogStore::new(progress.ttl()));
            let bus: Arc<dyn ProgressBus> =
                Arc::new(InMemoryProgressBus::new(progress.channel_capacity));
            Ok((store, bus))
        }
        ProgressBackend::Redis => {
            let timeout = config.redis.timeout();
            let client = redis::Client::open(config.redis.url.as_str())?;
            let conn = tokio::time::timeout(timeout, client.get_multiplexed_tokio_connection())
                .await
                .map_err(|_| format!("Redis did not respond within {:?}", timeout))??;
            let keys = ProgressKeys::new(progress.key_prefix.clone());

            tracing::info!(key_prefix = %progress.key_prefix, "Connected to Redis");
            let store: Arc<dyn EventLogStore> = Arc::new(RedisEventLogStore::new(
                conn.clone(),
                keys.clone(),
                progress.ttl(),
                timeout,
            ));
            let bus: Arc<dyn ProgressBus> =
                Arc::new(RedisProgressBus::new(client, conn, keys, timeout));
            Ok((store, bus))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
