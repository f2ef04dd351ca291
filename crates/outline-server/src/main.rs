//! outline-server binary: probe the pipeline, then serve until Ctrl-C.

use anyhow::Context as _;
use clap::Parser;
use outline_server::{AppState, ServerConfig, StartupStatus, create_app};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .init();

    let startup = StartupStatus::probe();
    match &startup {
        StartupStatus::Ready => info!("image processing pipeline loaded"),
        StartupStatus::Unavailable { reason } => {
            error!(%reason, "image processing pipeline unavailable; serving health errors");
        }
    }

    let app = create_app(
        AppState::new(startup, config.debug),
        config.max_upload_bytes,
    );

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        addr = %listener.local_addr()?,
        debug = config.debug,
        max_upload_bytes = config.max_upload_bytes,
        "outline server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

/// Resolve on Ctrl-C. If the handler cannot be installed, never resolve.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C; graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}
