//! Offline Shell - an offline-first caching proxy
//!
//! Serves an upstream site through a service-worker style cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_shell::cache::MemoryPartitionStore;
use offline_shell::network::HttpNetwork;
use offline_shell::{create_router, AppState, Config, Registration, ServiceWorker, WorkerOptions};

/// Main entry point for the offline shell proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the partition store and the upstream client
/// 4. Register the worker (install, precache, activate)
/// 5. Create Axum router and start the HTTP server
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_shell=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Offline Shell");

    let config = Config::from_env();
    info!(
        "Configuration loaded: origin={}, upstream={}, version={}, port={}, precache_assets={}",
        config.origin,
        config.upstream_url,
        config.cache_version,
        config.server_port,
        config.precache_assets.len()
    );

    let store = Arc::new(MemoryPartitionStore::new());
    let network = Arc::new(
        HttpNetwork::new(&config.origin, &config.upstream_url, config.fetch_timeout)
            .context("Failed to build HTTP client")?,
    );

    let registration = Arc::new(Registration::new(store.clone()));
    let worker = Arc::new(ServiceWorker::new(
        WorkerOptions::from_config(&config),
        store,
        network.clone(),
    ));
    let report = registration
        .register(worker)
        .await
        .context("Failed to register worker")?;
    info!(
        "Worker installed: {} asset(s) precached, {} failure(s)",
        report.stored.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        warn!("Precache failed for {}: {}", failure.url, failure.reason);
    }

    let state = AppState::new(registration, network, config.origin.clone());
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
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
}
