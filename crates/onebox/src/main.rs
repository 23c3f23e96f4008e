//! `Onebox` - lead inbox service
//!
//! Serves search, manual categorization and reply suggestions over HTTP,
//! and categorizes mail pushed by the ingestion source.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod routes;

use std::net::SocketAddr;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onebox_core::{Config, Onebox};

/// Messages buffered between the ingestion endpoint and the pipeline.
const INGEST_QUEUE_DEPTH: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "onebox=info,onebox_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Onebox");

    let config = Config::load().await.context("failed to load configuration")?;
    let onebox = Onebox::from_config(&config).context("failed to initialise services")?;

    let (ingest_tx, ingest_rx) = mpsc::channel(INGEST_QUEUE_DEPTH);
    let ingest_loop = {
        let pipeline = onebox.pipeline.clone();
        tokio::spawn(async move { pipeline.run_ingest(ingest_rx).await })
    };

    let background = std::sync::Arc::clone(&onebox.background);
    let app = routes::router(routes::AppState {
        onebox,
        ingest: ingest_tx,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // The router owned the last sender; the loop ends once the queue drains.
    if let Err(e) = ingest_loop.await {
        tracing::warn!(error = %e, "Ingestion loop did not finish cleanly");
    }
    background.drain().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
