//! # moviedb server
//!
//! Serves the movie catalog as JSON and cover art on demand.
//!
//! ## Architecture
//!
//! The server is built on Axum and uses:
//! - MongoDB for the catalog (or an in-memory store with `--in-memory`)
//! - the `image` crate for covers, thumbnails and face crops
//! - an optional HTTP face detection service

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moviedb_server::{
    infra::{
        config::Config,
        startup::{build_state, connect_store, face_detector},
    },
    routes,
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "moviedb-server")]
#[command(about = "Movie catalog and cover image server")]
struct Cli {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Keep the catalog in memory instead of MongoDB
    #[arg(long, env = "CATALOG_IN_MEMORY", default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                |_| {
                    "moviedb_server=debug,moviedb_core=debug,tower_http=info"
                        .into()
                },
            ),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(host) = cli.host {
        config.server_host = host;
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    config.catalog_in_memory |= cli.in_memory;

    config.ensure_directories()?;
    let config = Arc::new(config);

    let (store, handles) = connect_store(&config).await?;
    let state = build_state(config.clone(), store, face_detector(&config)?);
    let app = routes::create_app(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", listener.local_addr()?);
    info!("Serving images from {}", config.image_root().display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, closing connections");
    handles.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
