//! Bible Cache - persistent cache core for a Bible reading app
//!
//! Serves the chapter cache, translation cache, AI history and reader state to
//! the browser UI over a local HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bible_cache::api::{create_router, AppState};
use bible_cache::storage::{FileStore, QuotaEstimator};
use bible_cache::{spawn_quota_monitor, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the file-backed store and restore every logical store
/// 4. Start the background quota monitor
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bible_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Bible cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: chapters={}, translations={}, quota_threshold={}, check_interval={}s, port={}",
        config.chapter_capacity,
        config.translation_capacity,
        config.quota_threshold,
        config.quota_check_interval,
        config.server_port
    );

    let quota = QuotaEstimator::quota_for(&config.platform_id);
    let backend = FileStore::open(&config.data_file, Some(quota))
        .with_context(|| format!("opening {}", config.data_file.display()))?;
    info!(
        "Backing store at {} with a {} byte quota",
        config.data_file.display(),
        quota
    );

    let state = AppState::from_config(&config, Arc::new(backend));
    state.load().await.context("restoring stores")?;

    let monitor_handle = spawn_quota_monitor(state.chapters.clone(), config.quota_check_interval);
    info!("Quota monitor started");

    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(monitor_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the quota monitor and allows graceful shutdown.
async fn shutdown_signal(monitor_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    monitor_handle.abort();
    warn!("Quota monitor aborted");
}
