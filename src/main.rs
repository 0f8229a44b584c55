use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::signal;

use library_server::{
    config::{AppConfig, StoreBackend},
    create_router,
    services::{blob::LocalBlobStore, database::Database},
    store::Stores,
    utils, AppState,
};

/// Graceful shutdown signal handler
///
/// Resolves on Ctrl+C or SIGTERM so in-flight requests can complete.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

async fn open_stores(config: &AppConfig) -> Result<Stores> {
    match config.database.backend {
        StoreBackend::Mongo => {
            let database = Database::new(&config.database.url, &config.database.name).await?;
            database.ensure_indexes().await?;
            Ok(Stores::mongo(&database))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            Ok(Stores::memory())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    utils::logging::init_logging()?;

    let config = Arc::new(AppConfig::load()?);
    let stores = open_stores(&config).await?;

    let blobs = Arc::new(LocalBlobStore::new(&config.uploads.dir));
    tokio::fs::create_dir_all(blobs.root()).await?;

    let state = AppState::new(config.clone(), stores, blobs);
    let app = create_router(state);

    let addr = SocketAddr::from((config.server.host.parse::<std::net::IpAddr>()?, config.server.port));
    tracing::info!("Starting {} v{} on {}", config.app.name, config.app.version, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
