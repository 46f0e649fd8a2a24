//! Read-through cache server
//!
//! Serves upstream API responses through a bounded TTL/LRU cache with
//! stampede protection.

use std::fmt::Display;
use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use readthrough_cache::{api::create_router, AppState, Config};

/// Main entry point for the read-through cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the cache and upstream client
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "readthrough_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting read-through cache server");

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}ms, port={}, upstream={}",
        config.max_entries, config.default_ttl_ms, config.server_port, config.upstream_base_url
    );

    let state = AppState::from_config(&config)?;
    info!("Cache store initialized");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = signal_or_pending(signal::ctrl_c(), "Ctrl+C");

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
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

/// Resolves when `signal` fires. If the listener could not be installed the
/// error is logged and this never resolves, so it cannot trigger a shutdown.
async fn signal_or_pending<F, E>(signal: F, name: &str)
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    if let Err(err) = signal.await {
        tracing::error!("Failed to listen for {}: {}", name, err);
        std::future::pending::<()>().await;
    }
}
