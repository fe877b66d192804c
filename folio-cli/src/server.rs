use std::sync::Arc;

use anyhow::{Context, Result};
use folio_core::{Config, SqlitePostStore, api};
use tokio::net::TcpListener;

/// Run the HTTP server until SIGINT/SIGTERM.
pub async fn serve(config: Config) -> Result<()> {
    if !config.debug && config.uses_default_secret() {
        tracing::warn!("SECRET_KEY is the development default; set a real one in production");
    }
    if config.spotify_credentials().is_none() {
        tracing::info!("Spotify credentials missing, /spotify/ will report not configured");
    }

    let store = SqlitePostStore::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database '{}'", config.database_url))?;
    tracing::info!(database = %config.database_url, "Database ready");

    let listener = bind(&config.host, config.port).await?;
    let addr = listener.local_addr().context("Failed to read the bound address")?;
    let app = api::router(api::AppState::new(config, Arc::new(store)));
    tracing::info!(%addr, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Bind `host:port`. The host may be an IP address or a resolvable name.
async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))
}

/// Wait for Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
